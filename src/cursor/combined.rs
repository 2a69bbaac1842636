use super::handle::BorderValueHandle;
use std::marker::PhantomData;

/// Composes two handles into one handle over a composite border value.
///
/// The encoding is the first handle's tokens followed by the second's, so
/// `width` is the sum of the parts. Decoding fails if either part fails.
/// Wiring is plain function pointers: how to build the composite from its
/// parts and how to take it back apart.
pub struct CombinedBorderValue<F, S, C, H1, H2> {
    first: H1,
    second: H2,
    combine: fn(F, S) -> C,
    split_first: fn(&C) -> F,
    split_second: fn(&C) -> S,
    _marker: PhantomData<fn() -> (F, S, C)>,
}

impl<F, S, C, H1, H2> CombinedBorderValue<F, S, C, H1, H2>
where
    H1: BorderValueHandle<F>,
    H2: BorderValueHandle<S>,
{
    pub fn new(
        first: H1,
        second: H2,
        combine: fn(F, S) -> C,
        split_first: fn(&C) -> F,
        split_second: fn(&C) -> S,
    ) -> Self {
        Self {
            first,
            second,
            combine,
            split_first,
            split_second,
            _marker: PhantomData,
        }
    }
}

impl<F, S, C, H1, H2> BorderValueHandle<C> for CombinedBorderValue<F, S, C, H1, H2>
where
    H1: BorderValueHandle<F>,
    H2: BorderValueHandle<S>,
{
    fn width(&self) -> usize {
        self.first.width() + self.second.width()
    }

    fn write_tokens(&self, value: &C, out: &mut [String]) {
        let split = self.first.width();
        self.first
            .write_tokens(&(self.split_first)(value), &mut out[..split]);
        self.second
            .write_tokens(&(self.split_second)(value), &mut out[split..self.width()]);
    }

    fn read_tokens(&self, input: &[String]) -> Option<C> {
        if input.len() < self.width() {
            return None;
        }
        let split = self.first.width();
        let first = self.first.read_tokens(&input[..split])?;
        let second = self.second.read_tokens(&input[split..])?;
        Some((self.combine)(first, second))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::handle::{I64Handle, UuidHandle};
    use uuid::Uuid;

    fn pair_handle()
    -> CombinedBorderValue<i64, Uuid, (i64, Uuid), I64Handle, UuidHandle> {
        CombinedBorderValue::new(
            I64Handle,
            UuidHandle,
            |id, user| (id, user),
            |pair| pair.0,
            |pair| pair.1,
        )
    }

    #[test]
    fn test_combined_round_trip() {
        let handle = pair_handle();
        assert_eq!(handle.width(), 2);

        let value = (-77i64, Uuid::new_v4());
        let mut out = vec![String::new(); 2];
        handle.write_tokens(&value, &mut out);
        assert_eq!(handle.read_tokens(&out), Some(value));
    }

    #[test]
    fn test_combined_fails_when_either_part_fails() {
        let handle = pair_handle();
        let bad_first = vec!["abc".to_string(), Uuid::new_v4().as_simple().to_string()];
        assert_eq!(handle.read_tokens(&bad_first), None);

        let bad_second = vec!["5".to_string(), "not-a-uuid".to_string()];
        assert_eq!(handle.read_tokens(&bad_second), None);

        let too_short = vec!["5".to_string()];
        assert_eq!(handle.read_tokens(&too_short), None);
    }

    #[test]
    fn test_combined_writes_only_its_range() {
        let handle = pair_handle();
        let value = (12i64, Uuid::nil());

        let mut buffer = vec!["keep".to_string(); 4];
        handle.write_tokens(&value, &mut buffer[1..3]);

        assert_eq!(buffer[0], "keep");
        assert_eq!(buffer[3], "keep");
        assert_eq!(handle.read_tokens(&buffer[1..3]), Some(value));
    }
}

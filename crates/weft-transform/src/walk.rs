//! The lockstep walk shared by every pairwise transformer.
//!
//! Both operands describe the same base document. The walk feeds their
//! components in document order and hands each pairwise rule set two kinds
//! of callbacks:
//!
//! - an *event* for a zero-length component (an insertion or an annotation
//!   boundary) at the current position;
//! - an *overlap* for two equal-length pieces, one from each operand,
//!   covering the same base items.
//!
//! The operand that is ahead parks the unmatched tail of its last component
//! in a [`RangeCache`]; the operand that is behind consumes it piece by
//! piece. At equal positions the first operand's events come first.

use weft_core::{Component, DocOp};

use crate::error::{Result, TransformError};
use crate::position::{PositionTracker, RelativePosition};

/// Which operand a component belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    First,
    Second,
}

/// The per-transformer rules driven by [`walk`].
pub trait PairRules {
    /// A zero-length component of `side` at the current position.
    fn event(&mut self, side: Side, component: Component) -> Result<()>;

    /// Pieces of both operands covering the same base items.
    fn overlap(&mut self, first: Component, second: Component) -> Result<()>;
}

/// The unmatched remainder of the ahead operand's last component.
#[derive(Debug, Default)]
pub struct RangeCache {
    pending: Option<Component>,
}

impl RangeCache {
    pub fn is_empty(&self) -> bool {
        self.pending.is_none()
    }

    /// Park a remainder. Fails if one is already parked.
    fn put(&mut self, component: Component) -> std::result::Result<(), Component> {
        match self.pending {
            Some(_) => Err(component),
            None => {
                self.pending = Some(component);
                Ok(())
            }
        }
    }

    /// Take the first `n` items of the parked remainder.
    fn take(&mut self, n: usize) -> Option<Component> {
        let (head, tail) = self.pending.take()?.split_at(n);
        self.pending = tail;
        Some(head)
    }
}

/// Walk `first` and `second` in lockstep, driving `rules`.
pub fn walk<R: PairRules>(rules: &mut R, first: &DocOp, second: &DocOp) -> Result<()> {
    let tracker = PositionTracker::new();
    let mut walker = Walker {
        first_position: tracker.position_for_first(),
        second_position: tracker.position_for_second(),
        first_cache: RangeCache::default(),
        second_cache: RangeCache::default(),
        first_len: first.input_len(),
        second_len: second.input_len(),
    };

    let mut second_components = second.components().iter();
    for component in first.components() {
        walker.feed(rules, Side::First, component.clone())?;
        while walker.first_position.get() > 0 {
            match second_components.next() {
                Some(component) => walker.feed(rules, Side::Second, component.clone())?,
                None => {
                    return Err(TransformError::RanOut {
                        pending: walker.first_position.get(),
                    })
                }
            }
        }
    }
    for component in second_components {
        walker.feed(rules, Side::Second, component.clone())?;
    }

    if walker.first_position.get() != 0
        || !walker.first_cache.is_empty()
        || !walker.second_cache.is_empty()
    {
        return Err(walker.mismatch());
    }
    Ok(())
}

struct Walker<'a> {
    first_position: RelativePosition<'a>,
    second_position: RelativePosition<'a>,
    first_cache: RangeCache,
    second_cache: RangeCache,
    first_len: usize,
    second_len: usize,
}

impl Walker<'_> {
    fn mismatch(&self) -> TransformError {
        TransformError::LengthMismatch {
            first: self.first_len,
            second: self.second_len,
        }
    }

    fn feed<R: PairRules>(&mut self, rules: &mut R, side: Side, component: Component) -> Result<()> {
        let len = component.input_len();
        if len == 0 {
            return rules.event(side, component);
        }

        let mismatch = self.mismatch();
        let (position, own, other) = match side {
            Side::First => (
                self.first_position,
                &mut self.first_cache,
                &mut self.second_cache,
            ),
            Side::Second => (
                self.second_position,
                &mut self.second_cache,
                &mut self.first_cache,
            ),
        };

        let lag = -position.get();
        position.increase(len);

        let rest = if lag > 0 {
            let covered = len.min(lag as usize);
            let (head, tail) = component.split_at(covered);
            let theirs = other.take(covered).ok_or_else(|| mismatch.clone())?;
            match side {
                Side::First => rules.overlap(head, theirs)?,
                Side::Second => rules.overlap(theirs, head)?,
            }
            tail
        } else {
            Some(component)
        };

        if let Some(remainder) = rest {
            if own.put(remainder).is_err() {
                return Err(mismatch);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records callbacks as strings.
    #[derive(Default)]
    struct Recorder {
        log: Vec<String>,
    }

    impl PairRules for Recorder {
        fn event(&mut self, side: Side, component: Component) -> Result<()> {
            self.log.push(format!("{:?} {:?}", side, component));
            Ok(())
        }

        fn overlap(&mut self, first: Component, second: Component) -> Result<()> {
            assert_eq!(first.input_len(), second.input_len());
            self.log.push(format!("{:?} ~ {:?}", first, second));
            Ok(())
        }
    }

    #[test]
    fn test_overlaps_split_at_unit_level() {
        let first = DocOp::builder().retain(2).characters("X").retain(2).build();
        let second = DocOp::builder()
            .retain(3)
            .delete_characters("b")
            .build();
        let mut recorder = Recorder::default();
        walk(&mut recorder, &first, &second).unwrap();
        assert_eq!(
            recorder.log,
            vec![
                "Retain(2) ~ Retain(2)",
                "First Characters(\"X\")",
                "Retain(1) ~ Retain(1)",
                "Retain(1) ~ DeleteCharacters(\"b\")",
            ]
        );
    }

    #[test]
    fn test_first_operand_events_come_first() {
        let first = DocOp::builder().retain(1).characters("X").build();
        let second = DocOp::builder().retain(1).characters("Y").build();
        let mut recorder = Recorder::default();
        walk(&mut recorder, &first, &second).unwrap();
        assert_eq!(
            recorder.log,
            vec![
                "Retain(1) ~ Retain(1)",
                "First Characters(\"X\")",
                "Second Characters(\"Y\")",
            ]
        );
    }

    #[test]
    fn test_length_errors() {
        let mut recorder = Recorder::default();
        let short = DocOp::identity(2);
        let long = DocOp::identity(3);
        assert!(matches!(
            walk(&mut recorder, &long, &short),
            Err(TransformError::RanOut { pending: 1 })
        ));
        assert!(matches!(
            walk(&mut recorder, &short, &long),
            Err(TransformError::LengthMismatch { first: 2, second: 3 })
        ));
    }
}

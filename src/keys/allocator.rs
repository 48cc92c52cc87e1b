//! Unique key allocator
//!
//! Named monotonic sequences kept in a `Seqs` slot. The slot set that holds
//! the sequences decides the scope: a date's slot set gives date-scoped keys
//! that vanish with the date, the global slot set gives process-scoped keys.

use std::borrow::Cow;

use crate::error::{Result, TallyError};
use crate::module::Module;
use crate::registry::{Metric, StrIntMap};
use crate::store::SlotSet;

/// A named sequence inside a scope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sequence {
    /// Free-form date-scoped keys
    Date,
    /// Free-form process-scoped keys
    Global,
    /// Keymap keys of one module within a date
    Keymap(Module),
    /// Aggregate-cache keymap keys of one module
    CacheKeymap(Module),
    /// Visitor identities (ip|date|agent) within a date
    UniqueKeys,
    /// User-agent catalog
    AgentKeys,
}

impl Sequence {
    fn name(&self) -> Cow<'static, str> {
        match self {
            Sequence::Date => Cow::Borrowed("date"),
            Sequence::Global => Cow::Borrowed("global"),
            Sequence::Keymap(module) => Cow::Owned(format!("keymap:{}", module.name())),
            Sequence::CacheKeymap(module) => Cow::Owned(format!("cache:{}", module.name())),
            Sequence::UniqueKeys => Cow::Borrowed("unique_keys"),
            Sequence::AgentKeys => Cow::Borrowed("agent_keys"),
        }
    }
}

/// Hands out keys from the sequences stored in one slot set
pub struct KeyAllocator<'a> {
    seqs: &'a mut SlotSet,
}

impl<'a> KeyAllocator<'a> {
    pub fn new(seqs: &'a mut SlotSet) -> Self {
        Self { seqs }
    }

    /// Allocate the next key of `sequence`. The first key is 1.
    pub fn next(&mut self, sequence: &Sequence) -> Result<u32> {
        let name = sequence.name();
        let map = self.seqs.get_or_create::<StrIntMap>(Metric::Seqs)?;

        if let Some(current) = map.get_mut(name.as_ref()) {
            *current = current.checked_add(1).ok_or_else(|| {
                TallyError::InvalidArgument(format!("sequence {} exhausted", name))
            })?;
            return Ok(*current);
        }

        map.try_reserve(1)?;
        map.insert(name.into_owned(), 1);
        Ok(1)
    }

    /// Make sure the next call to [`KeyAllocator::next`] for `sequence`
    /// cannot fail: room for the sequence entry is reserved and the
    /// sequence must not be exhausted. Nothing is allocated.
    pub fn prepare(&mut self, sequence: &Sequence) -> Result<()> {
        let name = sequence.name();
        let map = self.seqs.get_or_create::<StrIntMap>(Metric::Seqs)?;

        match map.get(name.as_ref()) {
            Some(&u32::MAX) => Err(TallyError::InvalidArgument(format!(
                "sequence {} exhausted",
                name
            ))),
            Some(_) => Ok(()),
            None => Ok(map.try_reserve(1)?),
        }
    }

    /// Last key handed out by `sequence`, if any
    pub fn current(&self, sequence: &Sequence) -> Option<u32> {
        self.seqs
            .get::<StrIntMap>(Metric::Seqs)?
            .get(sequence.name().as_ref())
            .copied()
    }
}

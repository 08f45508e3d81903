//! Navigation cursor - the "currently displayed record" of one category
//!
//! The cursor remembers only the key it last showed. Every move goes back to
//! the store, so edits made elsewhere are picked up on the next step.

use crate::record::{PersonRecord, RecordKey};
use crate::storage::RecordStore;
use crate::Result;

/// What the cursor is pointing at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorState {
    #[default]
    NoRecordShown,
    ShowingRecord(RecordKey),
}

/// Outcome of a cursor operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation<R> {
    /// A record to display; the cursor now points at it
    Shown(R),
    /// Nothing to display
    Empty,
    /// A search for this key came up empty
    NotFound(RecordKey),
}

impl<R> Navigation<R> {
    pub fn record(&self) -> Option<&R> {
        match self {
            Navigation::Shown(r) => Some(r),
            Navigation::Empty | Navigation::NotFound(_) => None,
        }
    }

    pub fn into_record(self) -> Option<R> {
        match self {
            Navigation::Shown(r) => Some(r),
            Navigation::Empty | Navigation::NotFound(_) => None,
        }
    }
}

/// Steps through one [`RecordStore`] in key order, wrapping at both ends.
pub struct Cursor<'a, R: PersonRecord> {
    store: &'a RecordStore<R>,
    state: CursorState,
}

impl<'a, R: PersonRecord> Cursor<'a, R> {
    pub fn new(store: &'a RecordStore<R>) -> Self {
        Self {
            store,
            state: CursorState::NoRecordShown,
        }
    }

    /// Resume from a key shown earlier. The key need not exist any more.
    pub fn at(store: &'a RecordStore<R>, key: RecordKey) -> Self {
        Self {
            store,
            state: CursorState::ShowingRecord(key),
        }
    }

    pub fn state(&self) -> CursorState {
        self.state
    }

    pub fn current_key(&self) -> Option<RecordKey> {
        match self.state {
            CursorState::ShowingRecord(key) => Some(key),
            CursorState::NoRecordShown => None,
        }
    }

    /// First data load: show the record with the smallest key
    pub fn load(&mut self) -> Result<Navigation<R>> {
        let found = self.store.find_first()?;
        Ok(self.settle(found))
    }

    pub fn next(&mut self) -> Result<Navigation<R>> {
        let found = match self.state {
            CursorState::NoRecordShown => self.store.find_first()?,
            CursorState::ShowingRecord(key) => self.store.find_next_circular(key)?,
        };
        Ok(self.settle(found))
    }

    /// Step back; with nothing shown this starts at the last record
    pub fn previous(&mut self) -> Result<Navigation<R>> {
        let found = match self.state {
            CursorState::NoRecordShown => self.store.find_last()?,
            CursorState::ShowingRecord(key) => self.store.find_previous_circular(key)?,
        };
        Ok(self.settle(found))
    }

    pub fn search(&mut self, key: RecordKey) -> Result<Navigation<R>> {
        match self.store.find_by_key(key)? {
            Some(record) => Ok(self.settle(Some(record))),
            None => {
                self.state = CursorState::NoRecordShown;
                Ok(Navigation::NotFound(key))
            }
        }
    }

    /// Delete the shown record and move to its successor, else its predecessor.
    ///
    /// Does nothing when no record is shown.
    pub fn delete_current(&mut self) -> Result<Navigation<R>> {
        let CursorState::ShowingRecord(key) = self.state else {
            return Ok(Navigation::Empty);
        };

        self.store.delete(key)?;

        let found = match self.store.find_next_circular(key)? {
            Some(record) => Some(record),
            None => self.store.find_previous_circular(key)?,
        };
        Ok(self.settle(found))
    }

    /// Re-read the shown record
    pub fn refresh(&mut self) -> Result<Navigation<R>> {
        match self.state {
            CursorState::NoRecordShown => Ok(Navigation::Empty),
            CursorState::ShowingRecord(key) => {
                let found = self.store.find_by_key(key)?;
                Ok(self.settle(found))
            }
        }
    }

    fn settle(&mut self, found: Option<R>) -> Navigation<R> {
        match found {
            Some(record) => {
                self.state = CursorState::ShowingRecord(record.key());
                Navigation::Shown(record)
            }
            None => {
                self.state = CursorState::NoRecordShown;
                Navigation::Empty
            }
        }
    }
}

//! Fixtures shared by the unit tests of this crate.

use async_trait::async_trait;
use std::sync::Mutex;
use uuid::Uuid;

use crate::domain::{BookData, BookRecord};
use crate::ports::{PortError, PortResult, RecordStore};

/// A record that passes validation.
pub fn sample_book(accession_number: &str) -> BookData {
    BookData {
        accession_number: accession_number.to_string(),
        title: "Sample Title".to_string(),
        ddc: "000".to_string(),
        class_number: "1.307973".to_string(),
        author_notation: "W15".to_string(),
        copyright_year: 2018,
        copy: 1,
        ris_number: 1017,
        date_added: "2024-05-01T00:00:00.000Z".to_string(),
        ..BookData::default()
    }
}

#[derive(Default)]
pub struct MemoryRecords {
    books: Mutex<Vec<BookRecord>>,
}

impl MemoryRecords {
    pub fn len(&self) -> usize {
        self.books.lock().unwrap().len()
    }
}

#[async_trait]
impl RecordStore for MemoryRecords {
    async fn list_all(&self) -> PortResult<Vec<BookRecord>> {
        Ok(self.books.lock().unwrap().clone())
    }

    async fn get_one(&self, id: Uuid) -> PortResult<BookRecord> {
        self.books
            .lock()
            .unwrap()
            .iter()
            .find(|b| b.id == id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(id.to_string()))
    }

    async fn find_by_accession(&self, accession_number: &str) -> PortResult<Option<BookRecord>> {
        Ok(self
            .books
            .lock()
            .unwrap()
            .iter()
            .find(|b| b.data.accession_number == accession_number)
            .cloned())
    }

    async fn create_one(&self, data: BookData) -> PortResult<BookRecord> {
        let record = BookRecord { id: Uuid::new_v4(), data };
        self.books.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn update_one(&self, id: Uuid, data: BookData) -> PortResult<BookRecord> {
        let mut books = self.books.lock().unwrap();
        let book = books
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| PortError::NotFound(id.to_string()))?;
        book.data = data;
        Ok(book.clone())
    }

    async fn delete_one(&self, id: Uuid) -> PortResult<()> {
        self.books.lock().unwrap().retain(|b| b.id != id);
        Ok(())
    }
}

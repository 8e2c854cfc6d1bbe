use std::{
    collections::VecDeque,
    io::{self, Read},
    marker::PhantomData,
};

use csv::{Reader, StringRecord, Trim};
use serde::{Deserialize, de::DeserializeOwned};

use crate::account::{AccountId, Amount};

#[derive(Debug, Deserialize)]
pub struct AccountRecord {
    pub account: AccountId,
    pub balance: Amount,
}

#[derive(Debug, Deserialize)]
pub struct TransferRecord {
    pub from: AccountId,
    pub to: AccountId,
    pub amount: Amount,
}

/// Remembers byte offsets of newlines passing through, so a byte position
/// can be mapped back to a physical line, blank lines included.
struct LineTracker<R> {
    inner: R,
    offset: u64,
    newlines: VecDeque<u64>,
    lines_passed: u64,
}

impl<R: Read> Read for LineTracker<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let read = self.inner.read(buf)?;
        for (idx, byte) in buf[..read].iter().enumerate() {
            if *byte == b'\n' {
                self.newlines.push_back(self.offset + idx as u64);
            }
        }
        self.offset += read as u64;
        Ok(read)
    }
}

impl<R> LineTracker<R> {
    fn new(inner: R) -> Self {
        Self {
            inner,
            offset: 0,
            newlines: VecDeque::new(),
            lines_passed: 0,
        }
    }

    /// 1-based line of `byte`. Positions must be queried in increasing order.
    fn line_at(&mut self, byte: u64) -> u64 {
        while self.newlines.front().is_some_and(|&newline| newline < byte) {
            self.newlines.pop_front();
            self.lines_passed += 1;
        }
        self.lines_passed + 1
    }
}

/// Parses CSV rows into `T`, yielding each row together with its line number
/// in the source.
///
/// Rows that fail to parse are yielded as errors, so the caller can report
/// them and carry on.
pub struct CsvRecordParser<R, T> {
    reader: Reader<LineTracker<R>>,
    headers: StringRecord,
    record: StringRecord,
    done: bool,
    _row: PhantomData<T>,
}

impl<R, T> CsvRecordParser<R, T>
where
    R: Read,
    T: DeserializeOwned,
{
    pub fn new(source: R) -> csv::Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .from_reader(LineTracker::new(source));
        let headers = reader.headers()?.clone();

        Ok(Self {
            reader,
            headers,
            record: StringRecord::new(),
            done: false,
            _row: PhantomData,
        })
    }

    fn line_at(&mut self, byte: Option<u64>) -> u64 {
        byte.map_or(0, |byte| self.reader.get_mut().line_at(byte))
    }
}

impl<R, T> Iterator for CsvRecordParser<R, T>
where
    R: Read,
    T: DeserializeOwned,
{
    type Item = (u64, csv::Result<T>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.read_record(&mut self.record) {
            Ok(false) => {
                self.done = true;
                None
            }
            Ok(true) => {
                let line = self.line_at(self.record.position().map(|pos| pos.byte()));
                Some((line, self.record.deserialize(Some(&self.headers))))
            }
            Err(err) => {
                // reading can't make progress after an I/O failure
                self.done = err.is_io_error();
                let line = self.line_at(err.position().map(|pos| pos.byte()));
                Some((line, Err(err)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_rows_with_line_numbers() {
        let input = "from, to, amount\n1, 2, 150\n2,x,1\n\n3,1,-4\n\n\n4,1,7\n";
        let rows: Vec<_> = CsvRecordParser::<_, TransferRecord>::new(input.as_bytes())
            .unwrap()
            .collect();
        assert_eq!(rows.len(), 4);

        let (line, row) = &rows[0];
        assert_eq!(*line, 2);
        let row = row.as_ref().unwrap();
        assert_eq!((row.from, row.to, row.amount), (1, 2, 150));

        assert_eq!(rows[1].0, 3);
        assert!(rows[1].1.is_err());

        // blank lines still count
        let (line, row) = &rows[2];
        assert_eq!(*line, 5);
        assert_eq!(row.as_ref().unwrap().amount, -4);

        let (line, row) = &rows[3];
        assert_eq!(*line, 8);
        assert_eq!(row.as_ref().unwrap().from, 4);
    }

    #[test]
    fn crlf_line_endings() {
        let input = "account,balance\r\n1,10\r\n\r\n2,20\r\n";
        let lines: Vec<_> = CsvRecordParser::<_, AccountRecord>::new(input.as_bytes())
            .unwrap()
            .map(|(line, row)| (line, row.unwrap().balance))
            .collect();
        assert_eq!(lines, vec![(2, 10), (4, 20)]);
    }

    #[test]
    fn line_tracker_maps_offsets() {
        let mut tracker = LineTracker::new("a\n\nbc\nd".as_bytes());
        let mut buf = Vec::new();
        tracker.read_to_end(&mut buf).unwrap();
        assert_eq!(tracker.line_at(0), 1);
        assert_eq!(tracker.line_at(2), 2);
        assert_eq!(tracker.line_at(3), 3);
        assert_eq!(tracker.line_at(6), 4);
    }

    #[test]
    fn empty_input_yields_nothing() {
        let mut parser = CsvRecordParser::<_, AccountRecord>::new("".as_bytes()).unwrap();
        assert!(parser.next().is_none());
    }
}

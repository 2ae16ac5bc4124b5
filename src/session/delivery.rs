use serde::Serialize;
use serde_json::json;
use std::io::{self, Write};

use crate::events::EventType;
use crate::taste::Style;

/// One narrated event as handed to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentaryRecord {
    pub time: u64,
    pub event_type: EventType,
    pub commentary: String,
    pub style: Style,
}

pub const END_MESSAGE: &str = "Game ended";

/// Where session output goes.
pub trait Delivery {
    fn deliver(&mut self, record: &CommentaryRecord) -> io::Result<()>;
    /// Called exactly once after the last record.
    fn finish(&mut self) -> io::Result<()>;
    fn fail(&mut self, message: &str) -> io::Result<()>;
}

/// Collects records and writes them as one JSON array on finish.
pub struct BatchDelivery<W: Write> {
    out: W,
    records: Vec<CommentaryRecord>,
}

impl<W: Write> BatchDelivery<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            records: Vec::new(),
        }
    }

    pub fn records(&self) -> &[CommentaryRecord] {
        &self.records
    }
}

impl<W: Write> Delivery for BatchDelivery<W> {
    fn deliver(&mut self, record: &CommentaryRecord) -> io::Result<()> {
        self.records.push(record.clone());
        Ok(())
    }

    fn finish(&mut self) -> io::Result<()> {
        serde_json::to_writer_pretty(&mut self.out, &self.records)?;
        writeln!(self.out)?;
        self.out.flush()
    }

    fn fail(&mut self, message: &str) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, &json!({ "error": message }))?;
        writeln!(self.out)?;
        self.out.flush()
    }
}

/// Writes each record as it is produced, using server-sent-event framing.
pub struct StreamDelivery<W: Write> {
    out: W,
}

impl<W: Write> StreamDelivery<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn frame(&mut self, event: Option<&str>, data: &str) -> io::Result<()> {
        if let Some(event) = event {
            writeln!(self.out, "event: {event}")?;
        }
        writeln!(self.out, "data: {data}")?;
        writeln!(self.out)?;
        self.out.flush()
    }
}

impl<W: Write> Delivery for StreamDelivery<W> {
    fn deliver(&mut self, record: &CommentaryRecord) -> io::Result<()> {
        let data = serde_json::to_string(record)?;
        self.frame(None, &data)
    }

    fn finish(&mut self) -> io::Result<()> {
        self.frame(Some("end"), &json!({ "message": END_MESSAGE }).to_string())
    }

    fn fail(&mut self, message: &str) -> io::Result<()> {
        self.frame(Some("error"), &json!({ "error": message }).to_string())
    }
}

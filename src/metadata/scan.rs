//! Byte-level scans for the `"PeopleCount"` occupant marker.
//!
//! Two strategies share one grammar: the quoted key, optional whitespace, a
//! colon, optional whitespace, an optional opening quote, then a digit run.
//! [`tail_scan`] searches a file suffix for the last match. The
//! [`PeopleCountScanner`] walks a stream forward in arbitrary chunks and stops
//! at the first confirmed value.

use std::io::{self, ErrorKind, Read};

use memchr::memmem;

/// Quoted marker key preceding the occupant count.
pub const PEOPLE_COUNT_KEY: &[u8] = b"\"PeopleCount\"";

/// Present in files that describe a second participant.
pub const SECOND_PERSON_MARKER: &[u8] = b"Person#2";

/// Value implied by [`SECOND_PERSON_MARKER`].
pub const SECOND_PERSON_COUNT: u32 = 2;

/// Digit accumulation stops growing past this value.
pub const ACCUMULATION_CAP: u32 = 1_000_000;

/// Find the occupant count in a file suffix.
///
/// Tries the last well-formed key occurrence first and walks backwards past
/// malformed ones. Falls back to the second-participant marker.
#[must_use]
pub fn tail_scan(buf: &[u8]) -> Option<u32> {
	let finder = memmem::FinderRev::new(PEOPLE_COUNT_KEY);
	let mut end = buf.len();
	while let Some(at) = finder.rfind(&buf[..end]) {
		if let Some(value) = parse_value(&buf[at + PEOPLE_COUNT_KEY.len()..]) {
			return Some(value);
		}
		end = at;
	}
	memmem::find(buf, SECOND_PERSON_MARKER).map(|_| SECOND_PERSON_COUNT)
}

/// Reference forward scan over a complete buffer: first well-formed occurrence.
#[must_use]
pub fn scan_buffer(buf: &[u8]) -> Option<u32> {
	memmem::find_iter(buf, PEOPLE_COUNT_KEY)
		.find_map(|at| parse_value(&buf[at + PEOPLE_COUNT_KEY.len()..]))
}

/// Parse `: "123` style text following the key.
fn parse_value(rest: &[u8]) -> Option<u32> {
	let mut bytes = rest.iter().copied().peekable();
	while bytes.next_if(u8::is_ascii_whitespace).is_some() {}
	bytes.next_if_eq(&b':')?;
	while bytes.next_if(u8::is_ascii_whitespace).is_some() {}
	bytes.next_if_eq(&b'"');

	let mut value = None;
	while let Some(digit) = bytes.next_if(u8::is_ascii_digit) {
		value = Some(accumulate(value.unwrap_or(0), digit));
	}
	value
}

fn accumulate(value: u32, digit: u8) -> u32 {
	if value >= ACCUMULATION_CAP {
		return ACCUMULATION_CAP;
	}
	value * 10 + u32::from(digit - b'0')
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
	/// `matched` bytes of the key have been seen.
	Matching { matched: usize },
	/// Key complete, waiting for the colon.
	AfterKey,
	/// Colon seen, waiting for the first digit.
	AfterColon { quoted: bool },
	Digits { value: u32 },
	Found(u32),
}

/// Incremental forward scanner.
///
/// Feed it chunks of any size, including chunks that split the key or the
/// digit run. A byte that breaks a partial match is re-examined as the
/// possible start of a new one.
#[derive(Debug, Clone)]
pub struct PeopleCountScanner {
	phase: Phase,
}

impl Default for PeopleCountScanner {
	fn default() -> Self {
		Self::new()
	}
}

impl PeopleCountScanner {
	#[must_use]
	pub fn new() -> Self {
		Self {
			phase: Phase::Matching { matched: 0 },
		}
	}

	/// Consume `chunk`. Returns the value as soon as a digit run is terminated.
	pub fn feed(&mut self, chunk: &[u8]) -> Option<u32> {
		for &byte in chunk {
			if let Phase::Found(value) = self.phase {
				return Some(value);
			}
			self.step(byte);
		}
		match self.phase {
			Phase::Found(value) => Some(value),
			_ => None,
		}
	}

	/// End of input. A digit run that reaches the end still counts.
	#[must_use]
	pub fn finish(self) -> Option<u32> {
		match self.phase {
			Phase::Found(value) | Phase::Digits { value } => Some(value),
			_ => None,
		}
	}

	fn step(&mut self, byte: u8) {
		self.phase = match self.phase {
			Phase::Matching { matched } => match_key(matched, byte),
			Phase::AfterKey => match byte {
				b':' => Phase::AfterColon { quoted: false },
				b if b.is_ascii_whitespace() => Phase::AfterKey,
				b => restart(b),
			},
			Phase::AfterColon { quoted } => match byte {
				b'0'..=b'9' => Phase::Digits {
					value: u32::from(byte - b'0'),
				},
				b'"' if !quoted => Phase::AfterColon { quoted: true },
				b if b.is_ascii_whitespace() && !quoted => Phase::AfterColon { quoted },
				b => restart(b),
			},
			Phase::Digits { value } => match byte {
				b'0'..=b'9' => Phase::Digits {
					value: accumulate(value, byte),
				},
				_ => Phase::Found(value),
			},
			found @ Phase::Found(_) => found,
		};
	}
}

fn match_key(matched: usize, byte: u8) -> Phase {
	if PEOPLE_COUNT_KEY[matched] == byte {
		let matched = matched + 1;
		if matched == PEOPLE_COUNT_KEY.len() {
			Phase::AfterKey
		} else {
			Phase::Matching { matched }
		}
	} else {
		restart(byte)
	}
}

fn restart(byte: u8) -> Phase {
	if byte == PEOPLE_COUNT_KEY[0] {
		Phase::Matching { matched: 1 }
	} else {
		Phase::Matching { matched: 0 }
	}
}

/// Run the forward scanner over `reader` in `chunk_size` reads.
///
/// # Errors
///
/// Returns the first read error other than an interruption.
pub fn scan_reader<R: Read + ?Sized>(reader: &mut R, chunk_size: usize) -> io::Result<Option<u32>> {
	let mut scanner = PeopleCountScanner::new();
	let mut buf = vec![0; chunk_size.max(1)];
	loop {
		let read = match reader.read(&mut buf) {
			Ok(0) => return Ok(scanner.finish()),
			Ok(read) => read,
			Err(err) if err.kind() == ErrorKind::Interrupted => continue,
			Err(err) => return Err(err),
		};
		if let Some(value) = scanner.feed(&buf[..read]) {
			return Ok(Some(value));
		}
	}
}

#[cfg(test)]
mod tests {
	use std::io::Cursor;

	use super::*;

	const SAMPLE: &[u8] = br#"{"atoms":[{"id":"Person"}],"PeopleCount": "3","tail":true}"#;

	#[test]
	fn tail_scan_prefers_last_occurrence() {
		let buf = br#"{"PeopleCount":1,"nested":{"PeopleCount":2}}"#;
		assert_eq!(tail_scan(buf), Some(2));
		assert_eq!(scan_buffer(buf), Some(1));
	}

	#[test]
	fn tail_scan_skips_malformed_occurrences() {
		let buf = br#"{"PeopleCount":4,"label":"PeopleCount","PeopleCount":null}"#;
		assert_eq!(tail_scan(buf), Some(4));
	}

	#[test]
	fn tail_scan_falls_back_to_second_person_marker() {
		assert_eq!(tail_scan(br#"{"id":"Person#2"}"#), Some(SECOND_PERSON_COUNT));
		assert_eq!(tail_scan(br#"{"id":"Person"}"#), None);
	}

	#[test]
	fn streaming_matches_reference_for_every_split() {
		let expected = scan_buffer(SAMPLE);
		assert_eq!(expected, Some(3));
		for split in 0..=SAMPLE.len() {
			let mut scanner = PeopleCountScanner::new();
			let first = scanner.feed(&SAMPLE[..split]);
			let value = first.or_else(|| scanner.feed(&SAMPLE[split..])).or_else(|| scanner.finish());
			assert_eq!(value, expected, "split at {split}");
		}
	}

	#[test]
	fn streaming_matches_reference_for_tiny_chunks() {
		for chunk in 1..=7 {
			let value = scan_reader(&mut Cursor::new(SAMPLE), chunk).expect("read");
			assert_eq!(value, Some(3), "chunk size {chunk}");
		}
	}

	#[test]
	fn restarts_on_byte_that_breaks_a_partial_match() {
		let buf = br#"{""PeopleCount":5}"#;
		assert_eq!(scan_reader(&mut Cursor::new(&buf[..]), 1).expect("read"), Some(5));
		let buf = br#"{"People"PeopleCount":6}"#;
		assert_eq!(scan_reader(&mut Cursor::new(&buf[..]), 3).expect("read"), Some(6));
	}

	#[test]
	fn digit_run_at_end_of_stream_counts() {
		let buf = br#""PeopleCount":12"#;
		assert_eq!(scan_reader(&mut Cursor::new(&buf[..]), 4).expect("read"), Some(12));
	}

	#[test]
	fn absent_or_malformed_key_yields_none() {
		let buf = br#"{"PeopleCount":"x","other":1}"#;
		assert_eq!(scan_reader(&mut Cursor::new(&buf[..]), 5).expect("read"), None);
		assert_eq!(scan_reader(&mut Cursor::new(&b""[..]), 5).expect("read"), None);
	}

	#[test]
	fn accumulation_is_capped() {
		let buf = br#""PeopleCount":99999999999999999999,"#;
		assert_eq!(scan_buffer(buf), Some(ACCUMULATION_CAP));
		assert_eq!(
			scan_reader(&mut Cursor::new(&buf[..]), 2).expect("read"),
			Some(ACCUMULATION_CAP)
		);
	}
}

//! MusicXML score reader
//!
//! Reads a `score-partwise` document into the cursor positions and measure tempo
//! map that [`build_timeline`](super::build_timeline) consumes.
//!
//! A cursor position exists at every distinct onset of any note or rest in any
//! part. Pitched notes are attached to the position they start at; grace notes take
//! no time and are skipped. Offsets are in whole notes, converted from each part's
//! `<divisions>` (divisions per quarter note).
//!
//! Tempo comes from `<metronome>` marks (beat unit, optional dot, per-minute). A
//! `<sound tempo="..."/>` without a metronome mark in the same direction counts as
//! quarter-note BPM.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::SyncError;
use super::types::{BeatUnit, MeasureInfo, NoteId, ScoreNote, ScorePosition, ScoreSource, TempoMark};

/// Onsets closer than this (in whole notes) share a cursor position.
const ONSET_EPSILON: f64 = 1e-9;

/// Read a MusicXML document.
///
/// # Example
/// ```rust
/// use fred::score::read_musicxml;
///
/// let xml = r#"<score-partwise version="4.0">
///   <part id="P1">
///     <measure number="1">
///       <attributes><divisions>1</divisions></attributes>
///       <note><pitch><step>C</step><octave>4</octave></pitch><duration>2</duration></note>
///       <note><rest/><duration>2</duration></note>
///     </measure>
///   </part>
/// </score-partwise>"#;
///
/// let source = read_musicxml(xml).unwrap();
/// assert_eq!(source.positions.len(), 2);
/// assert_eq!(source.positions[0].notes[0].midi_note, 60);
/// assert_eq!(source.positions[1].offset, 0.5);
/// ```
pub fn read_musicxml(xml: &str) -> Result<ScoreSource, SyncError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut state = ReaderState::default();
    let mut path: Vec<String> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = element_name(&e);
                state.open(&name, &e)?;
                path.push(name);
            }
            Ok(Event::Empty(e)) => {
                let name = element_name(&e);
                state.open(&name, &e)?;
                state.close(&name)?;
            }
            Ok(Event::End(_)) => {
                if let Some(name) = path.pop() {
                    state.close(&name)?;
                }
            }
            Ok(Event::Text(t)) => {
                let text = t.unescape().map_err(|e| SyncError::ParseError {
                    measure: state.current_measure(),
                    message: e.to_string(),
                })?;
                if let Some(name) = path.last() {
                    state.text(name, &text)?;
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(SyncError::ParseError {
                    measure: state.current_measure(),
                    message: format!("at byte {}: {}", reader.buffer_position(), e),
                })
            }
        }
    }

    state.finish()
}

fn element_name(e: &BytesStart) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

#[derive(Debug, Default)]
struct NoteBuilder {
    chord: bool,
    rest: bool,
    grace: bool,
    step: Option<char>,
    alter: f64,
    octave: Option<i32>,
    duration: f64,
}

impl NoteBuilder {
    fn midi_note(&self) -> Option<u8> {
        if self.rest {
            return None;
        }
        let semitone = match self.step? {
            'C' => 0,
            'D' => 2,
            'E' => 4,
            'F' => 5,
            'G' => 7,
            'A' => 9,
            'B' => 11,
            _ => return None,
        };
        let midi = (self.octave? + 1) * 12 + semitone + self.alter.round() as i32;
        Some(midi.clamp(0, 127) as u8)
    }
}

#[derive(Debug, Default)]
struct MetronomeBuilder {
    beat_unit: Option<BeatUnit>,
    dotted: bool,
    bpm: Option<f64>,
}

#[derive(Debug)]
struct Onset {
    offset: f64,
    measure_index: usize,
    note: Option<ScoreNote>,
}

#[derive(Debug)]
struct ReaderState {
    saw_root: bool,
    parts: usize,
    in_measure: bool,
    measure_index: usize,
    /// Start of the current measure, whole notes.
    measure_start: f64,
    /// Position within the current measure, whole notes.
    position: f64,
    /// Furthest position reached in the current measure.
    extent: f64,
    last_onset: f64,
    divisions: f64,
    note: Option<NoteBuilder>,
    /// Pending `<backup>` (-1) or `<forward>` (+1) and its duration.
    shift: Option<(f64, f64)>,
    in_direction: bool,
    direction_mark: Option<TempoMark>,
    direction_sound: Option<f64>,
    metronome: Option<MetronomeBuilder>,
    measures: Vec<MeasureInfo>,
    onsets: Vec<Onset>,
    next_note_id: usize,
}

impl Default for ReaderState {
    fn default() -> Self {
        Self {
            saw_root: false,
            parts: 0,
            in_measure: false,
            measure_index: 0,
            measure_start: 0.0,
            position: 0.0,
            extent: 0.0,
            last_onset: 0.0,
            divisions: 1.0,
            note: None,
            shift: None,
            in_direction: false,
            direction_mark: None,
            direction_sound: None,
            metronome: None,
            measures: Vec::new(),
            onsets: Vec::new(),
            next_note_id: 0,
        }
    }
}

impl ReaderState {
    fn current_measure(&self) -> Option<usize> {
        self.in_measure.then_some(self.measure_index + 1)
    }

    fn error(&self, message: impl Into<String>) -> SyncError {
        SyncError::ParseError {
            measure: self.current_measure(),
            message: message.into(),
        }
    }

    fn open(&mut self, name: &str, e: &BytesStart) -> Result<(), SyncError> {
        match name {
            "score-partwise" => self.saw_root = true,
            "score-timewise" => {
                return Err(self.error("score-timewise documents are not supported"));
            }
            "part" if self.saw_root => {
                self.measure_index = 0;
                self.measure_start = 0.0;
                self.divisions = 1.0;
            }
            "measure" => {
                self.in_measure = true;
                self.position = 0.0;
                self.extent = 0.0;
                if self.measures.len() <= self.measure_index {
                    self.measures.resize_with(self.measure_index + 1, MeasureInfo::default);
                }
            }
            "note" => self.note = Some(NoteBuilder::default()),
            "chord" => {
                if let Some(note) = self.note.as_mut() {
                    note.chord = true;
                }
            }
            "rest" => {
                if let Some(note) = self.note.as_mut() {
                    note.rest = true;
                }
            }
            "grace" => {
                if let Some(note) = self.note.as_mut() {
                    note.grace = true;
                }
            }
            "backup" => self.shift = Some((-1.0, 0.0)),
            "forward" => self.shift = Some((1.0, 0.0)),
            "direction" => {
                self.in_direction = true;
                self.direction_mark = None;
                self.direction_sound = None;
            }
            "metronome" => self.metronome = Some(MetronomeBuilder::default()),
            "beat-unit-dot" => {
                if let Some(metronome) = self.metronome.as_mut() {
                    metronome.dotted = true;
                }
            }
            "sound" => {
                let tempo = e
                    .try_get_attribute("tempo")
                    .map_err(|err| self.error(err.to_string()))?;
                if let Some(attr) = tempo {
                    let value = attr.unescape_value().map_err(|err| self.error(err.to_string()))?;
                    match value.trim().parse::<f64>() {
                        Ok(bpm) if bpm > 0.0 => {
                            if self.in_direction {
                                self.direction_sound.get_or_insert(bpm);
                            } else {
                                self.push_tempo(TempoMark { bpm, ..TempoMark::default() });
                            }
                        }
                        _ => tracing::warn!("Ignoring sound tempo '{}' in measure {}", value, self.measure_index + 1),
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn text(&mut self, name: &str, text: &str) -> Result<(), SyncError> {
        match name {
            "divisions" => {
                let divisions: f64 = text
                    .trim()
                    .parse()
                    .map_err(|_| self.error(format!("invalid divisions '{}'", text)))?;
                if !(divisions > 0.0) {
                    return Err(self.error("divisions must be positive"));
                }
                self.divisions = divisions;
            }
            "duration" => {
                let duration: f64 = text
                    .trim()
                    .parse()
                    .map_err(|_| self.error(format!("invalid duration '{}'", text)))?;
                let whole_notes = duration.max(0.0) / self.divisions / 4.0;
                if let Some(note) = self.note.as_mut() {
                    note.duration = whole_notes;
                } else if let Some(shift) = self.shift.as_mut() {
                    shift.1 = whole_notes;
                }
            }
            "step" => {
                if let Some(note) = self.note.as_mut() {
                    note.step = text.trim().chars().next().map(|c| c.to_ascii_uppercase());
                }
            }
            "alter" => {
                if let Some(note) = self.note.as_mut() {
                    note.alter = text.trim().parse().unwrap_or(0.0);
                }
            }
            "octave" => {
                if self.note.is_some() {
                    let octave: i32 = text
                        .trim()
                        .parse()
                        .map_err(|_| self.error(format!("invalid octave '{}'", text)))?;
                    if let Some(note) = self.note.as_mut() {
                        note.octave = Some(octave);
                    }
                }
            }
            "beat-unit" => {
                if let Some(metronome) = self.metronome.as_mut() {
                    metronome.beat_unit = BeatUnit::from_name(text);
                }
            }
            "per-minute" => {
                if let Some(metronome) = self.metronome.as_mut() {
                    metronome.bpm = leading_number(text);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn close(&mut self, name: &str) -> Result<(), SyncError> {
        match name {
            "note" => {
                if let Some(note) = self.note.take() {
                    self.finish_note(note);
                }
            }
            "backup" | "forward" => {
                if let Some((direction, duration)) = self.shift.take() {
                    self.position = (self.position + direction * duration).max(0.0);
                    self.extent = self.extent.max(self.position);
                }
            }
            "metronome" => {
                if let Some(metronome) = self.metronome.take() {
                    match (metronome.beat_unit, metronome.bpm) {
                        (Some(beat_unit), Some(bpm)) if bpm > 0.0 => {
                            let mark = TempoMark {
                                bpm,
                                beat_unit,
                                dotted: metronome.dotted,
                            };
                            if self.in_direction {
                                self.direction_mark.get_or_insert(mark);
                            } else {
                                self.push_tempo(mark);
                            }
                        }
                        _ => tracing::debug!("Skipping incomplete metronome mark in measure {}", self.measure_index + 1),
                    }
                }
            }
            "direction" => {
                let sound = self.direction_sound.take().map(|bpm| TempoMark {
                    bpm,
                    ..TempoMark::default()
                });
                if let Some(mark) = self.direction_mark.take().or(sound) {
                    self.push_tempo(mark);
                }
                self.in_direction = false;
            }
            "measure" => {
                self.measure_start += self.extent;
                self.measure_index += 1;
                self.in_measure = false;
            }
            "part" => self.parts += 1,
            _ => {}
        }
        Ok(())
    }

    fn push_tempo(&mut self, mark: TempoMark) {
        if self.measures.len() <= self.measure_index {
            self.measures.resize_with(self.measure_index + 1, MeasureInfo::default);
        }
        self.measures[self.measure_index].tempo_marks.push(mark);
    }

    fn finish_note(&mut self, note: NoteBuilder) {
        if note.grace {
            return;
        }
        let onset = if note.chord {
            self.last_onset
        } else {
            let onset = self.position;
            self.last_onset = onset;
            self.position += note.duration;
            self.extent = self.extent.max(self.position);
            onset
        };

        let score_note = note.midi_note().map(|midi_note| {
            let id = NoteId(self.next_note_id);
            self.next_note_id += 1;
            ScoreNote { id, midi_note }
        });

        self.onsets.push(Onset {
            offset: self.measure_start + onset,
            measure_index: self.measure_index,
            note: score_note,
        });
    }

    fn finish(mut self) -> Result<ScoreSource, SyncError> {
        if !self.saw_root {
            return Err(self.error("not a score-partwise document"));
        }
        if self.parts == 0 {
            return Err(self.error("score has no parts"));
        }

        self.onsets.sort_by(|a, b| {
            a.offset
                .total_cmp(&b.offset)
                .then(a.measure_index.cmp(&b.measure_index))
        });

        let mut positions: Vec<ScorePosition> = Vec::new();
        for onset in self.onsets {
            let same_position = positions
                .last()
                .is_some_and(|p| (onset.offset - p.offset).abs() < ONSET_EPSILON);
            if !same_position {
                positions.push(ScorePosition {
                    measure_index: onset.measure_index,
                    offset: onset.offset,
                    notes: Vec::new(),
                });
            }
            if let (Some(note), Some(position)) = (onset.note, positions.last_mut()) {
                position.notes.push(note);
            }
        }

        Ok(ScoreSource {
            measures: self.measures,
            positions,
        })
    }
}

/// First number in a `<per-minute>` text such as `"120"` or `"c. 96"`.
fn leading_number(text: &str) -> Option<f64> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let rest = &text[start..];
    let end = rest
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(rest.len());
    rest[..end].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leading_number() {
        assert_eq!(leading_number("120"), Some(120.0));
        assert_eq!(leading_number("c. 96"), Some(96.0));
        assert_eq!(leading_number("72.5-76"), Some(72.5));
        assert_eq!(leading_number("fast"), None);
    }

    #[test]
    fn test_note_builder_midi() {
        let note = NoteBuilder {
            step: Some('A'),
            octave: Some(4),
            ..NoteBuilder::default()
        };
        assert_eq!(note.midi_note(), Some(69));

        let sharp = NoteBuilder {
            step: Some('F'),
            alter: 1.0,
            octave: Some(3),
            ..NoteBuilder::default()
        };
        assert_eq!(sharp.midi_note(), Some(54));

        let rest = NoteBuilder {
            rest: true,
            ..NoteBuilder::default()
        };
        assert_eq!(rest.midi_note(), None);
    }
}

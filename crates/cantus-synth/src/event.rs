//! Note events consumed by the voice controllers.

/// A note edge, as decoded from MIDI or injected by the command protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteEvent {
    NoteOn { note: u8, velocity: u8 },
    NoteOff { note: u8 },
}

impl NoteEvent {
    /// A full-velocity note-on, as the `note_on` command injects.
    pub fn note_on(note: u8) -> Self {
        Self::NoteOn {
            note,
            velocity: 127,
        }
    }

    pub fn note_off(note: u8) -> Self {
        Self::NoteOff { note }
    }

    /// The note this event refers to.
    pub fn note(&self) -> u8 {
        match *self {
            Self::NoteOn { note, .. } => note,
            Self::NoteOff { note } => note,
        }
    }
}

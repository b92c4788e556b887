//! Line-based stand-in for a chat transport.
//!
//! # Invariants
//! - Photos are copied out before `send_photo` returns; the dispatcher
//!   deletes the original right after.
//! - Button presses target the most recent message that carried choices.

use citymap_core::{Choice, DeliveryError, DeliveryResult, MessageId, ReplySink, UserId};
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

pub struct ConsoleSink<W: Write> {
    out: W,
    save_dir: Option<PathBuf>,
    next_message_id: MessageId,
    texts: HashMap<MessageId, String>,
    last_choices: Option<MessageId>,
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(out: W, save_dir: Option<PathBuf>) -> Self {
        Self {
            out,
            save_dir,
            next_message_id: 1,
            texts: HashMap::new(),
            last_choices: None,
        }
    }

    /// Message that a button press would come from.
    pub fn last_choices(&self) -> Option<MessageId> {
        self.last_choices
    }

    fn allocate(&mut self, text: &str) -> MessageId {
        let id = self.next_message_id;
        self.next_message_id += 1;
        self.texts.insert(id, text.to_string());
        id
    }

    fn print(&mut self, line: &str) -> DeliveryResult<()> {
        writeln!(self.out, "{line}").map_err(|err| DeliveryError::Transport(err.to_string()))
    }

    fn print_choices(&mut self, choices: &[Choice]) -> DeliveryResult<()> {
        for choice in choices {
            self.print(&format!("    [{}] @{}", choice.label, choice.data))?;
        }
        Ok(())
    }
}

impl<W: Write> ReplySink for ConsoleSink<W> {
    fn send_text(&mut self, _chat_id: UserId, text: &str) -> DeliveryResult<MessageId> {
        let id = self.allocate(text);
        self.print(&format!("#{id} {text}"))?;
        Ok(id)
    }

    fn send_choices(
        &mut self,
        _chat_id: UserId,
        text: &str,
        choices: &[Choice],
    ) -> DeliveryResult<MessageId> {
        let id = self.allocate(text);
        self.print(&format!("#{id} {text}"))?;
        self.print_choices(choices)?;
        self.last_choices = Some(id);
        Ok(id)
    }

    fn send_photo(
        &mut self,
        _chat_id: UserId,
        photo: &Path,
        caption: &str,
    ) -> DeliveryResult<MessageId> {
        let stored = match &self.save_dir {
            Some(dir) => {
                let file_name = photo
                    .file_name()
                    .ok_or_else(|| DeliveryError::Transport("photo has no file name".to_string()))?;
                let target = dir.join(file_name);
                std::fs::create_dir_all(dir)
                    .and_then(|_| std::fs::copy(photo, &target))
                    .map_err(|err| DeliveryError::Transport(err.to_string()))?;
                Some(target)
            }
            None => None,
        };

        let id = self.allocate(caption);
        match stored {
            Some(target) => self.print(&format!("#{id} [photo {}] {caption}", target.display()))?,
            None => self.print(&format!("#{id} [photo] {caption}"))?,
        }
        Ok(id)
    }

    fn edit_text(
        &mut self,
        _chat_id: UserId,
        message_id: MessageId,
        text: &str,
        choices: &[Choice],
    ) -> DeliveryResult<()> {
        let Some(previous) = self.texts.get(&message_id) else {
            return Err(DeliveryError::Transport(format!("message #{message_id} not found")));
        };
        if previous == text && choices.is_empty() {
            return Err(DeliveryError::NotModified);
        }

        self.texts.insert(message_id, text.to_string());
        self.print(&format!("#{message_id} (edited) {text}"))?;
        self.print_choices(choices)?;
        if choices.is_empty() && self.last_choices == Some(message_id) {
            self.last_choices = None;
        }
        Ok(())
    }

    fn delete_message(&mut self, _chat_id: UserId, message_id: MessageId) -> DeliveryResult<()> {
        if self.texts.remove(&message_id).is_none() {
            return Err(DeliveryError::Transport(format!("message #{message_id} not found")));
        }
        self.print(&format!("#{message_id} (deleted)"))
    }

    fn answer_callback(
        &mut self,
        _callback_id: &str,
        text: &str,
        alert: bool,
    ) -> DeliveryResult<()> {
        let kind = if alert { "alert" } else { "notice" };
        self.print(&format!("  ({kind}) {text}"))
    }
}

#[cfg(test)]
mod tests {
    use super::ConsoleSink;
    use citymap_core::{Choice, DeliveryError, ReplySink};

    #[test]
    fn repeated_identical_edit_reports_not_modified() {
        let mut sink = ConsoleSink::new(Vec::new(), None);
        let id = sink.send_text(1, "hello").unwrap();
        assert_eq!(sink.edit_text(1, id, "hello", &[]), Err(DeliveryError::NotModified));
        sink.edit_text(1, id, "bye", &[]).unwrap();
    }

    #[test]
    fn choices_track_the_latest_selection_message() {
        let mut sink = ConsoleSink::new(Vec::new(), None);
        assert_eq!(sink.last_choices(), None);
        let id = sink
            .send_choices(1, "pick", &[Choice::new("Rome", "del_city_Rome")])
            .unwrap();
        assert_eq!(sink.last_choices(), Some(id));

        sink.edit_text(1, id, "done", &[]).unwrap();
        assert_eq!(sink.last_choices(), None);
    }

    #[test]
    fn photos_are_copied_into_save_dir() {
        let dir = tempfile::tempdir().unwrap();
        let photo = dir.path().join("map_1_Rome_x.png");
        std::fs::write(&photo, b"png").unwrap();
        let saved = dir.path().join("saved");

        let mut sink = ConsoleSink::new(Vec::new(), Some(saved.clone()));
        sink.send_photo(1, &photo, "Rome").unwrap();
        assert_eq!(std::fs::read(saved.join("map_1_Rome_x.png")).unwrap(), b"png");
    }
}

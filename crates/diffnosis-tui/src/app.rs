use std::path::Path;

use diffnosis_core::{RelaySession, Sex, UserProfile};
use tracing::warn;

use crate::input::LineInput;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Profile,
    Chat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileField {
    Name,
    Age,
    Email,
    Height,
    Weight,
    Sex,
    Photo,
}

impl ProfileField {
    pub fn all() -> [ProfileField; 7] {
        [
            ProfileField::Name,
            ProfileField::Age,
            ProfileField::Email,
            ProfileField::Height,
            ProfileField::Weight,
            ProfileField::Sex,
            ProfileField::Photo,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            ProfileField::Name => "Name",
            ProfileField::Age => "Age",
            ProfileField::Email => "Email",
            ProfileField::Height => "Height (cm)",
            ProfileField::Weight => "Weight (kg)",
            ProfileField::Sex => "Sex",
            ProfileField::Photo => "Photo (path)",
        }
    }

    pub fn next(&self) -> Self {
        let all = Self::all();
        let i = all.iter().position(|f| f == self).unwrap_or(0);
        all[(i + 1) % all.len()]
    }

    pub fn prev(&self) -> Self {
        let all = Self::all();
        let i = all.iter().position(|f| f == self).unwrap_or(0);
        all[(i + all.len() - 1) % all.len()]
    }
}

/// Editable copy of the profile. Only turned into a [`UserProfile`] when the
/// user moves on to the chat.
#[derive(Debug, Clone, Default)]
pub struct ProfileForm {
    pub name: LineInput,
    pub age: LineInput,
    pub email: LineInput,
    pub height: LineInput,
    pub weight: LineInput,
    pub sex: Sex,
    pub photo_path: LineInput,
}

impl ProfileForm {
    pub fn from_profile(profile: &UserProfile, photo_path: Option<&Path>) -> Self {
        Self {
            name: LineInput::new(profile.name.as_str()),
            age: LineInput::new(profile.age.as_str()),
            email: LineInput::new(profile.email.as_str()),
            height: LineInput::new(profile.height.as_str()),
            weight: LineInput::new(profile.weight.as_str()),
            sex: profile.sex,
            photo_path: LineInput::new(
                photo_path.map(|p| p.display().to_string()).unwrap_or_default(),
            ),
        }
    }

    /// The text input behind a field; `None` for the sex toggle.
    pub fn input_mut(&mut self, field: ProfileField) -> Option<&mut LineInput> {
        match field {
            ProfileField::Name => Some(&mut self.name),
            ProfileField::Age => Some(&mut self.age),
            ProfileField::Email => Some(&mut self.email),
            ProfileField::Height => Some(&mut self.height),
            ProfileField::Weight => Some(&mut self.weight),
            ProfileField::Sex => None,
            ProfileField::Photo => Some(&mut self.photo_path),
        }
    }

    pub fn input(&self, field: ProfileField) -> Option<&LineInput> {
        match field {
            ProfileField::Name => Some(&self.name),
            ProfileField::Age => Some(&self.age),
            ProfileField::Email => Some(&self.email),
            ProfileField::Height => Some(&self.height),
            ProfileField::Weight => Some(&self.weight),
            ProfileField::Sex => None,
            ProfileField::Photo => Some(&self.photo_path),
        }
    }

    /// Snapshot the form, reading the photo file if a path was given.
    pub fn to_profile(&self) -> anyhow::Result<UserProfile> {
        let profile = UserProfile {
            name: self.name.value().to_string(),
            age: self.age.value().to_string(),
            email: self.email.value().to_string(),
            height: self.height.value().to_string(),
            weight: self.weight.value().to_string(),
            sex: self.sex,
            photo: None,
        };

        let path = self.photo_path.value().trim();
        if path.is_empty() {
            Ok(profile)
        } else {
            profile.with_photo_file(path)
        }
    }
}

pub struct App {
    pub should_quit: bool,
    pub screen: Screen,

    // Profile form state
    pub form: ProfileForm,
    pub focused_field: ProfileField,
    pub status: Option<String>,

    // Chat state
    pub chat_input: LineInput,
    pub chat_scroll: u16,
    pub chat_height: u16, // Height of chat area for scroll calculations
    pub chat_width: u16,  // Width of chat area for wrap calculations
    pub animation_frame: u8, // 0-2 for ellipsis animation

    pub session: RelaySession,
    /// Shown in the chat title, e.g. "Groq: llama-3.2-11b-vision-preview"
    pub model_label: String,
}

impl App {
    pub fn new(session: RelaySession, form: ProfileForm, model_label: impl Into<String>) -> Self {
        Self {
            should_quit: false,
            screen: Screen::Profile,

            form,
            focused_field: ProfileField::Name,
            status: None,

            chat_input: LineInput::default(),
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            animation_frame: 0,

            session,
            model_label: model_label.into(),
        }
    }

    pub fn focused_input_mut(&mut self) -> Option<&mut LineInput> {
        self.form.input_mut(self.focused_field)
    }

    pub fn next_field(&mut self) {
        self.focused_field = self.focused_field.next();
    }

    pub fn prev_field(&mut self) {
        self.focused_field = self.focused_field.prev();
    }

    pub fn toggle_sex(&mut self) {
        self.form.sex = self.form.sex.toggled();
    }

    /// Leave the form for the chat and start a relay session.
    pub fn start_chat(&mut self) {
        match self.form.to_profile() {
            Ok(profile) => {
                self.status = None;
                self.chat_input.clear();
                self.chat_scroll = 0;
                self.session.session_start(profile);
                self.screen = Screen::Chat;
                self.scroll_chat_to_bottom();
            }
            Err(e) => {
                warn!("Could not start chat: {e:#}");
                self.status = Some(format!("{e:#}"));
                self.focused_field = ProfileField::Photo;
            }
        }
    }

    /// Back to the form. The conversation is discarded.
    pub fn leave_chat(&mut self) {
        self.session.session_end();
        self.chat_input.clear();
        self.chat_scroll = 0;
        self.screen = Screen::Profile;
    }

    pub fn submit_chat(&mut self) {
        match self.session.submit(self.chat_input.value()) {
            Ok(()) => {
                self.chat_input.clear();
                self.scroll_chat_to_bottom();
            }
            Err(e) if e.is_rejection() => {}
            Err(e) => warn!("Submission failed: {e}"),
        }
    }

    pub fn can_submit(&self) -> bool {
        !self.chat_input.value().trim().is_empty() && !self.session.is_sending()
    }

    /// Pick up a finished completion, if any.
    pub async fn poll_session(&mut self) {
        if self.session.poll_pending().await {
            self.scroll_chat_to_bottom();
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.session.is_sending() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn scroll_chat_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    pub fn scroll_chat_down(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_add(lines);
    }

    /// Scroll chat to bottom so the newest entry (or "Thinking...") is visible
    pub fn scroll_chat_to_bottom(&mut self) {
        // Use actual chat width for wrap calculation, default to 50 if not set
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: u16 = 0;

        for entry in self.session.observe_log() {
            total_lines += 1; // Speaker line ("You:" or "AI:")
            for line in entry.text.lines() {
                // Use character count, not byte length, for proper UTF-8 handling
                let char_count = line.chars().count();
                if char_count == 0 {
                    total_lines += 1;
                } else {
                    total_lines += ((char_count / wrap_width) + 1) as u16;
                }
            }
            total_lines += 1; // Blank line after message
        }

        if self.session.is_sending() {
            total_lines += 2; // "AI:" + "Thinking..."
        }

        let visible_height = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };

        self.chat_scroll = total_lines.saturating_sub(visible_height);
    }
}

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::error::ValidationError;
use crate::model::{Credential, new_id};
use crate::views::input::TextInput;
use crate::views::{FormMode, FormStatus};

const LABEL_MAX: usize = 50;
const USERNAME_MAX: usize = 50;
const PASSWORD_MAX: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CredentialField {
    Label,
    Username,
    Password,
    Submit,
    Cancel,
}

const FIELDS: [CredentialField; 5] = [
    CredentialField::Label,
    CredentialField::Username,
    CredentialField::Password,
    CredentialField::Submit,
    CredentialField::Cancel,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CredentialDraft {
    pub(crate) credential: Credential,
    pub(crate) password: Option<String>,
    pub(crate) mode: FormMode,
}

#[derive(Debug, Clone)]
pub(crate) struct CredentialForm {
    mode: FormMode,
    id: String,
    label: TextInput,
    username: TextInput,
    password: TextInput,
    focus: usize,
    error: Option<String>,
    status: FormStatus,
    draft: Option<CredentialDraft>,
}

impl CredentialForm {
    pub(crate) fn new(
        mode: FormMode,
        existing: Option<&Credential>,
        password: Option<String>,
    ) -> Self {
        let mut form = Self {
            mode,
            id: new_id(),
            label: TextInput::new().max_chars(LABEL_MAX),
            username: TextInput::new().max_chars(USERNAME_MAX),
            password: TextInput::new().max_chars(PASSWORD_MAX).masked(),
            focus: 0,
            error: None,
            status: FormStatus::Editing,
            draft: None,
        };
        if let (FormMode::Edit, Some(existing)) = (mode, existing) {
            form.id = existing.id.clone();
            form.label = TextInput::with_value(existing.label.clone()).max_chars(LABEL_MAX);
            form.username =
                TextInput::with_value(existing.username.clone()).max_chars(USERNAME_MAX);
            form.password = TextInput::with_value(password.unwrap_or_default())
                .max_chars(PASSWORD_MAX)
                .masked();
        }
        form
    }

    pub(crate) fn update(mut self, key: KeyEvent) -> Self {
        if self.status != FormStatus::Editing {
            return self;
        }
        let ctrl_c =
            key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c');
        if key.code == KeyCode::Esc || ctrl_c {
            self.status = FormStatus::Cancelled;
            return self;
        }
        match key.code {
            KeyCode::Tab | KeyCode::Down => self.focus = (self.focus + 1) % FIELDS.len(),
            KeyCode::BackTab | KeyCode::Up => {
                self.focus = (self.focus + FIELDS.len() - 1) % FIELDS.len();
            }
            KeyCode::Enter => match self.focused() {
                CredentialField::Submit => self.submit(),
                CredentialField::Cancel => self.status = FormStatus::Cancelled,
                _ => self.focus = (self.focus + 1) % FIELDS.len(),
            },
            _ => {
                if let Some(input) = self.focused_input_mut() {
                    input.handle_key(key);
                }
            }
        }
        self
    }

    pub(crate) fn is_submitted(&self) -> bool {
        self.status == FormStatus::Submitted
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.status == FormStatus::Cancelled
    }

    pub(crate) fn value(&self) -> Option<&CredentialDraft> {
        self.draft.as_ref()
    }

    pub(crate) fn reopen_with_error(mut self, error: impl Into<String>) -> Self {
        self.status = FormStatus::Editing;
        self.draft = None;
        self.error = Some(error.into());
        self
    }

    pub(crate) fn mode(&self) -> FormMode {
        self.mode
    }

    pub(crate) fn fields(&self) -> &'static [CredentialField] {
        &FIELDS
    }

    pub(crate) fn focused(&self) -> CredentialField {
        FIELDS[self.focus % FIELDS.len()]
    }

    pub(crate) fn input(&self, field: CredentialField) -> Option<&TextInput> {
        match field {
            CredentialField::Label => Some(&self.label),
            CredentialField::Username => Some(&self.username),
            CredentialField::Password => Some(&self.password),
            CredentialField::Submit | CredentialField::Cancel => None,
        }
    }

    pub(crate) fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn focused_input_mut(&mut self) -> Option<&mut TextInput> {
        match self.focused() {
            CredentialField::Label => Some(&mut self.label),
            CredentialField::Username => Some(&mut self.username),
            CredentialField::Password => Some(&mut self.password),
            CredentialField::Submit | CredentialField::Cancel => None,
        }
    }

    fn submit(&mut self) {
        match self.validate() {
            Ok(draft) => {
                self.error = None;
                self.draft = Some(draft);
                self.status = FormStatus::Submitted;
            }
            Err(err) => self.error = Some(err.to_string()),
        }
    }

    fn validate(&self) -> Result<CredentialDraft, ValidationError> {
        let label = self.label.value().trim();
        if label.is_empty() {
            return Err(ValidationError::LabelRequired);
        }
        let username = self.username.value().trim();
        if username.is_empty() {
            return Err(ValidationError::UsernameRequired);
        }
        let password = self.password.value();
        if password.is_empty() && self.mode == FormMode::Add {
            return Err(ValidationError::PasswordRequired);
        }
        Ok(CredentialDraft {
            credential: Credential {
                id: self.id.clone(),
                label: label.to_string(),
                username: username.to_string(),
            },
            password: (!password.is_empty()).then(|| password.to_string()),
            mode: self.mode,
        })
    }
}

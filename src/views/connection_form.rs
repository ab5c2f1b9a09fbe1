use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::error::ValidationError;
use crate::model::{AuthMethod, Connection, ConnectionIcon, Credential, new_id};
use crate::views::input::TextInput;
use crate::views::{FormMode, FormStatus};

const LABEL_MAX: usize = 50;
const HOST_MAX: usize = 100;
const PORT_MAX: usize = 5;
const USERNAME_MAX: usize = 50;
const PASSWORD_MAX: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConnectionField {
    Label,
    Host,
    Port,
    Auth,
    Credential,
    Username,
    Password,
    Icon,
    Submit,
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ConnectionDraft {
    pub(crate) connection: Connection,
    pub(crate) password: Option<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct ConnectionForm {
    mode: FormMode,
    id: String,
    label: TextInput,
    host: TextInput,
    port: TextInput,
    username: TextInput,
    password: TextInput,
    auth: AuthMethod,
    credentials: Vec<Credential>,
    credential_index: usize,
    icon: ConnectionIcon,
    default_port: u16,
    fields: Vec<ConnectionField>,
    focus: usize,
    error: Option<String>,
    status: FormStatus,
    draft: Option<ConnectionDraft>,
}

impl ConnectionForm {
    pub(crate) fn new(
        mode: FormMode,
        existing: Option<&Connection>,
        password: Option<String>,
        credentials: Vec<Credential>,
        default_port: u16,
    ) -> Self {
        let mut form = Self {
            mode,
            id: new_id(),
            label: TextInput::new().max_chars(LABEL_MAX),
            host: TextInput::new().max_chars(HOST_MAX),
            port: TextInput::with_value(default_port.to_string()).max_chars(PORT_MAX),
            username: TextInput::new().max_chars(USERNAME_MAX),
            password: TextInput::new().max_chars(PASSWORD_MAX).masked(),
            auth: AuthMethod::Password,
            credentials,
            credential_index: 0,
            icon: ConnectionIcon::default(),
            default_port,
            fields: Vec::new(),
            focus: 0,
            error: None,
            status: FormStatus::Editing,
            draft: None,
        };
        if let (FormMode::Edit, Some(existing)) = (mode, existing) {
            form.id = existing.id.clone();
            form.label = TextInput::with_value(existing.label.clone()).max_chars(LABEL_MAX);
            form.host = TextInput::with_value(existing.host.clone()).max_chars(HOST_MAX);
            form.port = TextInput::with_value(existing.port.to_string()).max_chars(PORT_MAX);
            form.username =
                TextInput::with_value(existing.username.clone()).max_chars(USERNAME_MAX);
            form.password = TextInput::with_value(password.unwrap_or_default())
                .max_chars(PASSWORD_MAX)
                .masked();
            form.auth = existing.auth;
            form.icon = existing.icon.unwrap_or_default();
            form.credential_index = existing
                .credential_id
                .as_deref()
                .and_then(|id| form.credentials.iter().position(|cred| cred.id == id))
                .unwrap_or(0);
        }
        form.fields = form.active_fields();
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
            KeyCode::Tab | KeyCode::Down => self.advance_field(true),
            KeyCode::BackTab | KeyCode::Up => self.advance_field(false),
            KeyCode::Enter => match self.focused() {
                ConnectionField::Submit => self.submit(),
                ConnectionField::Cancel => self.status = FormStatus::Cancelled,
                _ => self.advance_field(true),
            },
            KeyCode::Left | KeyCode::Right | KeyCode::Char(' ')
                if self.is_choice_field(self.focused()) =>
            {
                self.cycle_choice(key.code != KeyCode::Left);
            }
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

    pub(crate) fn value(&self) -> Option<&ConnectionDraft> {
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

    pub(crate) fn fields(&self) -> &[ConnectionField] {
        &self.fields
    }

    pub(crate) fn focused(&self) -> ConnectionField {
        self.fields
            .get(self.focus)
            .copied()
            .unwrap_or(ConnectionField::Label)
    }

    pub(crate) fn input(&self, field: ConnectionField) -> Option<&TextInput> {
        match field {
            ConnectionField::Label => Some(&self.label),
            ConnectionField::Host => Some(&self.host),
            ConnectionField::Port => Some(&self.port),
            ConnectionField::Username => Some(&self.username),
            ConnectionField::Password => Some(&self.password),
            _ => None,
        }
    }

    pub(crate) fn auth(&self) -> AuthMethod {
        self.auth
    }

    pub(crate) fn selected_credential(&self) -> Option<&Credential> {
        self.credentials.get(self.credential_index)
    }

    pub(crate) fn icon(&self) -> ConnectionIcon {
        self.icon
    }

    pub(crate) fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn active_fields(&self) -> Vec<ConnectionField> {
        let mut fields = vec![
            ConnectionField::Label,
            ConnectionField::Host,
            ConnectionField::Port,
            ConnectionField::Auth,
        ];
        match self.auth {
            AuthMethod::Password => {
                fields.push(ConnectionField::Username);
                fields.push(ConnectionField::Password);
            }
            AuthMethod::Credential => fields.push(ConnectionField::Credential),
        }
        fields.push(ConnectionField::Icon);
        fields.push(ConnectionField::Submit);
        fields.push(ConnectionField::Cancel);
        fields
    }

    fn advance_field(&mut self, forward: bool) {
        let len = self.fields.len();
        if len == 0 {
            return;
        }
        self.focus = if forward {
            (self.focus + 1) % len
        } else if self.focus == 0 {
            len - 1
        } else {
            self.focus - 1
        };
    }

    fn is_choice_field(&self, field: ConnectionField) -> bool {
        matches!(
            field,
            ConnectionField::Auth | ConnectionField::Credential | ConnectionField::Icon
        )
    }

    fn cycle_choice(&mut self, forward: bool) {
        match self.focused() {
            ConnectionField::Auth => {
                self.auth = self.auth.toggle();
                self.fields = self.active_fields();
                self.focus = self
                    .fields
                    .iter()
                    .position(|field| *field == ConnectionField::Auth)
                    .unwrap_or(0);
            }
            ConnectionField::Credential => {
                let len = self.credentials.len();
                if len > 0 {
                    self.credential_index = if forward {
                        (self.credential_index + 1) % len
                    } else {
                        (self.credential_index + len - 1) % len
                    };
                }
            }
            ConnectionField::Icon => self.icon = self.icon.cycle(forward),
            _ => {}
        }
    }

    fn focused_input_mut(&mut self) -> Option<&mut TextInput> {
        match self.focused() {
            ConnectionField::Label => Some(&mut self.label),
            ConnectionField::Host => Some(&mut self.host),
            ConnectionField::Port => Some(&mut self.port),
            ConnectionField::Username => Some(&mut self.username),
            ConnectionField::Password => Some(&mut self.password),
            _ => None,
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

    fn validate(&self) -> Result<ConnectionDraft, ValidationError> {
        let label = self.label.value().trim();
        if label.is_empty() {
            return Err(ValidationError::LabelRequired);
        }
        let host = self.host.value().trim();
        if host.is_empty() {
            return Err(ValidationError::HostRequired);
        }
        let port = parse_port(self.port.value(), self.default_port)?;
        let (username, credential_id) = match self.auth {
            AuthMethod::Password => (self.username.value().trim().to_string(), None),
            AuthMethod::Credential => {
                let credential = self
                    .selected_credential()
                    .ok_or(ValidationError::NoCredentials)?;
                (String::new(), Some(credential.id.clone()))
            }
        };
        let password = match self.auth {
            AuthMethod::Password if !self.password.value().is_empty() => {
                Some(self.password.value().to_string())
            }
            _ => None,
        };
        Ok(ConnectionDraft {
            connection: Connection {
                id: self.id.clone(),
                label: label.to_string(),
                host: host.to_string(),
                port,
                username,
                auth: self.auth,
                credential_id,
                icon: Some(self.icon),
            },
            password,
        })
    }
}

fn parse_port(raw: &str, default_port: u16) -> Result<u16, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(default_port);
    }
    match raw.parse::<u16>() {
        Ok(port) if port > 0 => Ok(port),
        _ => Err(ValidationError::InvalidPort),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DEFAULT_PORT;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(mut form: ConnectionForm, text: &str) -> ConnectionForm {
        for ch in text.chars() {
            form = form.update(key(KeyCode::Char(ch)));
        }
        form
    }

    fn clear(mut form: ConnectionForm) -> ConnectionForm {
        form = form.update(key(KeyCode::End));
        for _ in 0..20 {
            form = form.update(key(KeyCode::Backspace));
        }
        form
    }

    fn focus(mut form: ConnectionForm, field: ConnectionField) -> ConnectionForm {
        for _ in 0..form.fields().len() {
            if form.focused() == field {
                return form;
            }
            form = form.update(key(KeyCode::Tab));
        }
        panic!("field {field:?} not reachable");
    }

    fn credential() -> Credential {
        Credential {
            id: "cred-1".to_string(),
            label: "ops".to_string(),
            username: "deploy".to_string(),
        }
    }

    fn filled(port: &str) -> ConnectionForm {
        let form = ConnectionForm::new(FormMode::Add, None, None, vec![], DEFAULT_PORT);
        let form = type_text(form, "box");
        let form = focus(form, ConnectionField::Host);
        let form = type_text(form, "h");
        let form = focus(form, ConnectionField::Port);
        let form = clear(form);
        let form = type_text(form, port);
        focus(form, ConnectionField::Submit)
    }

    #[test]
    fn empty_port_defaults_to_22() {
        let form = filled("").update(key(KeyCode::Enter));
        assert!(form.is_submitted());
        let draft = form.value().unwrap();
        assert_eq!(draft.connection.port, 22);
        assert_eq!(draft.connection.host, "h");
        assert!(draft.password.is_none());
    }

    #[test]
    fn out_of_range_port_keeps_form_open() {
        let form = filled("70000").update(key(KeyCode::Enter));
        assert!(!form.is_submitted());
        assert!(!form.is_cancelled());
        assert!(form.value().is_none());
        assert_eq!(form.error(), Some("invalid port number"));
    }

    #[test]
    fn port_zero_is_rejected() {
        let form = filled("0").update(key(KeyCode::Enter));
        assert_eq!(form.error(), Some("invalid port number"));
    }

    #[test]
    fn missing_label_and_host_are_reported_in_order() {
        let form = ConnectionForm::new(FormMode::Add, None, None, vec![], DEFAULT_PORT);
        let form = focus(form, ConnectionField::Submit).update(key(KeyCode::Enter));
        assert_eq!(form.error(), Some("label is required"));
        let form = focus(form, ConnectionField::Label);
        let form = type_text(form, "x");
        let form = focus(form, ConnectionField::Submit).update(key(KeyCode::Enter));
        assert_eq!(form.error(), Some("host is required"));
    }

    #[test]
    fn credential_auth_hides_user_fields() {
        let form = ConnectionForm::new(FormMode::Add, None, None, vec![credential()], 22);
        let form = focus(form, ConnectionField::Auth).update(key(KeyCode::Right));
        assert_eq!(form.auth(), AuthMethod::Credential);
        assert_eq!(form.focused(), ConnectionField::Auth);
        assert!(!form.fields().contains(&ConnectionField::Username));
        assert!(!form.fields().contains(&ConnectionField::Password));
        assert!(form.fields().contains(&ConnectionField::Credential));

        let mut form = form;
        for _ in 0..form.fields().len() * 2 {
            form = form.update(key(KeyCode::Tab));
            assert_ne!(form.focused(), ConnectionField::Username);
            assert_ne!(form.focused(), ConnectionField::Password);
        }
    }

    #[test]
    fn cycling_full_length_returns_to_start() {
        for auth_toggles in [0, 1] {
            let mut form = ConnectionForm::new(FormMode::Add, None, None, vec![], 22);
            if auth_toggles == 1 {
                form = focus(form, ConnectionField::Auth).update(key(KeyCode::Left));
            }
            let start = form.focused();
            let len = form.fields().len();
            for _ in 0..len {
                form = form.update(key(KeyCode::Down));
            }
            assert_eq!(form.focused(), start);
            for _ in 0..len {
                form = form.update(key(KeyCode::BackTab));
            }
            assert_eq!(form.focused(), start);
        }
    }

    #[test]
    fn credential_auth_without_credentials_is_rejected() {
        let form = filled("22");
        let form = focus(form, ConnectionField::Auth).update(key(KeyCode::Right));
        let form = focus(form, ConnectionField::Submit).update(key(KeyCode::Enter));
        assert!(!form.is_submitted());
        assert_eq!(
            form.error(),
            Some("no credentials available - create one first with 'c'")
        );
    }

    #[test]
    fn credential_auth_stores_reference_not_username() {
        let form = ConnectionForm::new(FormMode::Add, None, None, vec![credential()], 22);
        let form = type_text(form, "box");
        let form = focus(form, ConnectionField::Host);
        let form = type_text(form, "h");
        let form = focus(form, ConnectionField::Auth).update(key(KeyCode::Right));
        let form = focus(form, ConnectionField::Submit).update(key(KeyCode::Enter));
        let draft = form.value().unwrap();
        assert_eq!(draft.connection.auth, AuthMethod::Credential);
        assert_eq!(draft.connection.credential_id.as_deref(), Some("cred-1"));
        assert!(draft.connection.username.is_empty());
        assert!(draft.password.is_none());
    }

    #[test]
    fn edit_preserves_identity_and_prefills_password() {
        let existing = Connection {
            id: "keep-me".to_string(),
            label: "prod".to_string(),
            host: "10.0.0.5".to_string(),
            port: 2222,
            username: "root".to_string(),
            auth: AuthMethod::Password,
            credential_id: None,
            icon: Some(ConnectionIcon::Linux),
        };
        let form = ConnectionForm::new(
            FormMode::Edit,
            Some(&existing),
            Some("pw".to_string()),
            vec![],
            22,
        );
        assert_eq!(form.input(ConnectionField::Password).unwrap().value(), "pw");
        assert_eq!(form.input(ConnectionField::Password).unwrap().display(), "**");
        let form = focus(form, ConnectionField::Submit).update(key(KeyCode::Enter));
        let draft = form.value().unwrap();
        assert_eq!(draft.connection, existing);
        assert_eq!(draft.password.as_deref(), Some("pw"));
    }

    #[test]
    fn add_generates_fresh_ids() {
        let a = filled("").update(key(KeyCode::Enter));
        let b = filled("").update(key(KeyCode::Enter));
        assert_ne!(
            a.value().unwrap().connection.id,
            b.value().unwrap().connection.id
        );
    }

    #[test]
    fn quit_keys_are_text_or_cancel() {
        let form = ConnectionForm::new(FormMode::Add, None, None, vec![], 22);
        let form = form.update(key(KeyCode::Char('q')));
        assert_eq!(form.input(ConnectionField::Label).unwrap().value(), "q");
        assert!(!form.is_cancelled());
        let form = form.update(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(form.is_cancelled());
    }

    #[test]
    fn reopen_keeps_values_and_shows_error() {
        let form = filled("").update(key(KeyCode::Enter));
        let form = form.reopen_with_error("save failed");
        assert!(!form.is_submitted());
        assert_eq!(form.error(), Some("save failed"));
        assert_eq!(form.input(ConnectionField::Host).unwrap().value(), "h");
    }
}

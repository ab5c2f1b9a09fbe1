//! Interactive components. Each one owns its own state and reports intents
//! back to the router in `app`; none of them write to the stores.

pub(crate) mod browser;
pub(crate) mod connection_form;
pub(crate) mod credential_form;
pub(crate) mod credentials;
pub(crate) mod input;
pub(crate) mod menu;
pub(crate) mod modal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FormMode {
    Add,
    Edit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FormStatus {
    Editing,
    Submitted,
    Cancelled,
}

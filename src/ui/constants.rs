use ratatui::layout::Constraint;

pub(crate) const APP_TITLE: &str = "SKYBRIDGE";
pub(crate) const LIST_HELP_TEXT: &str =
    "Enter open | (a)dd | (e)dit | (d)elete | (c)redentials | (q)uit";
pub(crate) const CREDENTIALS_HELP_TEXT: &str = "(a)dd | (e)dit | (d)elete | Esc back";

pub(crate) const LABEL_WIDTH: usize = 10;

pub(crate) const HEADER_HEIGHT: u16 = 3;
pub(crate) const STATUS_HEIGHT: u16 = 1;
pub(crate) const LOGS_HEIGHT: u16 = 8;

pub(crate) const BODY_COLUMN_PERCENTAGES: [u16; 2] = [40, 60];

pub(crate) const MODAL_WIDTH_PERCENT: u16 = 70;
pub(crate) const MODAL_MAX_HEIGHT_PERCENT: u16 = 80;
pub(crate) const MODAL_MIN_WIDTH: u16 = 30;
pub(crate) const CONFIRM_WIDTH_PERCENT: u16 = 50;
pub(crate) const MENU_WIDTH: u16 = 44;

pub(crate) const POPUP_MIN_WIDTH: u16 = 10;
pub(crate) const POPUP_MIN_HEIGHT: u16 = 5;

pub(crate) const BROWSER_HELP: [&str; 2] = [
    "j/k move | Enter/l open | h up | g go to | ~ home | . hidden | ^u/^d half page | G bottom",
    "n file | N dir | r rename | d delete | y copy path | e edit | D download | q close",
];
pub(crate) const MODIFIED_FORMAT: &str = "%Y-%m-%d %H:%M";
pub(crate) const SIZE_COLUMN_WIDTH: usize = 9;

pub(crate) fn body_columns() -> [Constraint; 2] {
    BODY_COLUMN_PERCENTAGES.map(Constraint::Percentage)
}

// Native rfd dialogs and pickers for the shell

use rfd::{FileDialog, MessageButtons, MessageDialog, MessageLevel};
use std::path::PathBuf;

use i2v_gif::shell::{Dialogs, PathPicker, ERROR_TITLE, IMAGE_EXTENSIONS};

pub struct NativeDialogs;

impl NativeDialogs {
    fn show(level: MessageLevel, title: &str, message: &str) {
        MessageDialog::new()
            .set_level(level)
            .set_title(title)
            .set_description(message)
            .set_buttons(MessageButtons::Ok)
            .show();
    }
}

impl Dialogs for NativeDialogs {
    fn show_warning(&mut self, title: &str, message: &str) {
        Self::show(MessageLevel::Warning, title, message);
    }

    fn show_info(&mut self, title: &str, message: &str) {
        Self::show(MessageLevel::Info, title, message);
    }

    fn show_error(&mut self, title: &str, message: &str) {
        Self::show(MessageLevel::Error, title, message);
    }
}

pub struct NativePicker;

impl PathPicker for NativePicker {
    fn pick_image(&mut self) -> Option<PathBuf> {
        FileDialog::new()
            .add_filter("Image files", IMAGE_EXTENSIONS)
            .pick_file()
    }

    fn pick_folder(&mut self) -> Option<PathBuf> {
        FileDialog::new().pick_folder()
    }
}

/// Error box shown before the window exists
pub fn show_startup_error(message: &str) {
    NativeDialogs::show(MessageLevel::Error, ERROR_TITLE, message);
}

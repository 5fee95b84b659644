//! Native macOS dialogs using AppKit: NSOpenPanel for the loot export, an NSAlert with a scrolling
//! NSTextView accessory for the donation log paste, and NSAlert notices.
//! Everything runs modally on the main thread; no NSApplication run loop is started.

use objc2::rc::Retained;
use objc2::{msg_send, MainThreadMarker, MainThreadOnly};
use objc2_app_kit::{
    NSAlert, NSAlertStyle, NSApplication, NSApplicationActivationPolicy, NSModalResponse,
    NSOpenPanel, NSScrollView, NSTextView,
};
use objc2_foundation::{NSPoint, NSRect, NSSize, NSString, NSURL};
use std::path::PathBuf;

use crate::prompt::{
    Prompter, FILE_DIALOG_TITLE, PASTE_PROMPT, PASTE_TITLE, SUBMIT_LABEL,
};

/// Open panel prompt. The panel has no file-type popup, so any file can be picked here.
const OPEN_PANEL_MESSAGE: &str = "Choose the loot export.";

// NSAlert button return codes (first button = 1000, second = 1001, ...)
const NSALERT_FIRST_BUTTON_RETURN: NSModalResponse = 1000;
const NSMODAL_RESPONSE_OK: NSModalResponse = 1;

/// Size of the paste text area.
const PASTE_WIDTH: f64 = 560.0;
const PASTE_HEIGHT: f64 = 320.0;

pub struct NativePrompter {
    mtm: MainThreadMarker,
    /// Text of the last submit; shown again when the user has to resubmit.
    draft: String,
}

impl NativePrompter {
    /// `None` when not on the main thread.
    pub fn new() -> Option<Self> {
        let mtm = MainThreadMarker::new()?;
        // Regular: visible in dock and Cmd-Tab so the user can reach the dialogs.
        let app = NSApplication::sharedApplication(mtm);
        app.setActivationPolicy(NSApplicationActivationPolicy::Regular);
        // Force to front (deprecated on macOS 14+ but still helps on earlier versions).
        #[allow(deprecated)]
        app.activateIgnoringOtherApps(true);
        Some(NativePrompter {
            mtm,
            draft: String::new(),
        })
    }

    fn notice(&self, title: &str, message: &str, style: NSAlertStyle) {
        let alert = NSAlert::new(self.mtm);
        alert.setMessageText(&NSString::from_str(title));
        alert.setInformativeText(&NSString::from_str(message));
        let _: () = unsafe { msg_send![&alert, setAlertStyle: style] };
        alert.window().orderFrontRegardless();
        let _: NSModalResponse = unsafe { msg_send![&alert, runModal] };
    }
}

impl Prompter for NativePrompter {
    fn choose_file(&mut self) -> Option<PathBuf> {
        let panel = NSOpenPanel::openPanel(self.mtm);
        let title = NSString::from_str(FILE_DIALOG_TITLE);
        let message = NSString::from_str(OPEN_PANEL_MESSAGE);
        unsafe {
            let _: () = msg_send![&panel, setCanChooseFiles: true];
            let _: () = msg_send![&panel, setCanChooseDirectories: false];
            let _: () = msg_send![&panel, setAllowsMultipleSelection: false];
            let _: () = msg_send![&panel, setTitle: &*title];
            let _: () = msg_send![&panel, setMessage: &*message];
        }
        let response: NSModalResponse = unsafe { msg_send![&panel, runModal] };
        if response != NSMODAL_RESPONSE_OK {
            return None;
        }
        let url: Option<Retained<NSURL>> = unsafe { msg_send![&panel, URL] };
        let url = url?;
        let path: Option<Retained<NSString>> = unsafe { msg_send![&url, path] };
        Some(PathBuf::from(path?.to_string()))
    }

    fn ask_paste(&mut self) -> Option<String> {
        let frame = NSRect::new(NSPoint::new(0.0, 0.0), NSSize::new(PASTE_WIDTH, PASTE_HEIGHT));
        let scroll: Retained<NSScrollView> =
            unsafe { msg_send![NSScrollView::alloc(self.mtm), initWithFrame: frame] };
        let text_view: Retained<NSTextView> =
            unsafe { msg_send![NSTextView::alloc(self.mtm), initWithFrame: frame] };
        let draft = NSString::from_str(&self.draft);
        unsafe {
            let _: () = msg_send![&scroll, setHasVerticalScroller: true];
            let _: () = msg_send![&scroll, setDocumentView: &*text_view];
            let _: () = msg_send![&text_view, setString: &*draft];
        }

        let alert = NSAlert::new(self.mtm);
        alert.setMessageText(&NSString::from_str(PASTE_TITLE));
        alert.setInformativeText(&NSString::from_str(PASTE_PROMPT));
        alert.addButtonWithTitle(&NSString::from_str(SUBMIT_LABEL));
        alert.addButtonWithTitle(&NSString::from_str("Cancel"));
        let _: () = unsafe { msg_send![&alert, setAccessoryView: &*scroll] };

        // Force the alert window on top of other apps.
        alert.window().orderFrontRegardless();
        let response: NSModalResponse = unsafe { msg_send![&alert, runModal] };
        if response != NSALERT_FIRST_BUTTON_RETURN {
            return None;
        }
        let text: Retained<NSString> = unsafe { msg_send![&text_view, string] };
        let text = text.to_string();
        self.draft = text.clone();
        Some(text)
    }

    fn show_error(&mut self, title: &str, message: &str) {
        self.notice(title, message, NSAlertStyle::Critical);
    }

    fn show_info(&mut self, title: &str, message: &str) {
        self.notice(title, message, NSAlertStyle::Informational);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_panel_message_claims_no_filter() {
        assert!(!OPEN_PANEL_MESSAGE.contains("*."));
        assert!(!OPEN_PANEL_MESSAGE.contains("CSV"));
    }
}

//! Real clipboard round-trips. Needs a display server / desktop session:
//! `cargo test -p cc-platform -- --ignored`

use cc_core::ports::ClipboardWriterPort;
use cc_platform::{ArboardClipboardWriter, NativeClipboardWriter};

#[test]
#[ignore = "requires a system clipboard"]
fn native_writer_sets_clipboard_text() {
    let writer = NativeClipboardWriter::new();
    writer.write_text("cloudclip native").expect("native write");

    let mut clipboard = arboard::Clipboard::new().expect("open clipboard");
    assert_eq!(clipboard.get_text().expect("read back"), "cloudclip native");
}

#[test]
#[ignore = "requires a system clipboard"]
fn fallback_writer_sets_clipboard_text() {
    let writer = ArboardClipboardWriter::new();
    writer.write_text("cloudclip fallback").expect("fallback write");

    let mut clipboard = arboard::Clipboard::new().expect("open clipboard");
    assert_eq!(clipboard.get_text().expect("read back"), "cloudclip fallback");
}

#[test]
#[ignore = "requires a system clipboard"]
fn native_writer_keeps_serving_after_repeated_writes() {
    let writer = NativeClipboardWriter::new();
    writer.write_text("first").expect("first write");
    writer.write_text("second").expect("second write");

    let mut clipboard = arboard::Clipboard::new().expect("open clipboard");
    assert_eq!(clipboard.get_text().expect("read back"), "second");
}

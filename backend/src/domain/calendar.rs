//! iCalendar (RFC 5545) export of booked sessions.

use chrono::{DateTime, Utc};

use super::{Booking, BookingStatus, User};

const PRODID: &str = "-//Mentorship//Mentoring Sessions//EN";
const FOLD_AT: usize = 75;

/// Booking together with both participants, seen from one viewer.
#[derive(Debug, Clone, Copy)]
pub struct CalendarEntry<'a> {
    pub booking: &'a Booking,
    pub mentor: &'a User,
    pub learner: &'a User,
    pub viewer_is_mentor: bool,
}

/// Whether a booking belongs in a calendar export.
#[must_use]
pub const fn is_exportable(status: BookingStatus) -> bool {
    matches!(status, BookingStatus::Confirmed | BookingStatus::Completed)
}

/// Escape TEXT values: backslash, semicolon, comma and newlines.
#[must_use]
pub fn escape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            other => out.push(other),
        }
    }
    out
}

/// Quote a parameter value such as `CN`. Parameter values cannot carry
/// TEXT escapes, so double quotes and control characters are dropped.
#[must_use]
pub fn quote_param(value: &str) -> String {
    let inner: String = value
        .chars()
        .filter(|ch| *ch != '"' && !ch.is_control())
        .collect();
    format!("\"{inner}\"")
}

fn format_instant(at: DateTime<Utc>) -> String {
    at.format("%Y%m%dT%H%M%SZ").to_string()
}

/// Fold a content line at 75 octets without splitting a UTF-8 sequence.
fn push_line(out: &mut String, line: &str) {
    let mut width = 0;
    for ch in line.chars() {
        let len = ch.len_utf8();
        if width + len > FOLD_AT {
            out.push_str("\r\n ");
            width = 1;
        }
        out.push(ch);
        width += len;
    }
    out.push_str("\r\n");
}

fn push_event(out: &mut String, entry: &CalendarEntry<'_>, domain: &str, stamp: DateTime<Utc>) {
    let booking = entry.booking;
    let (summary, other) = if entry.viewer_is_mentor {
        ("Mentoring session with", entry.learner)
    } else {
        ("Learning session with", entry.mentor)
    };
    let notes = if booking.notes.is_empty() {
        "None"
    } else {
        booking.notes.as_str()
    };
    let description = format!(
        "{summary} {}\nNotes: {notes}\nSession ID: {}",
        other.display_name, booking.id
    );

    push_line(out, "BEGIN:VEVENT");
    push_line(out, &format!("UID:booking-{}@{domain}", booking.id));
    push_line(out, &format!("DTSTAMP:{}", format_instant(stamp)));
    push_line(out, &format!("DTSTART:{}", format_instant(booking.start_utc)));
    push_line(out, &format!("DTEND:{}", format_instant(booking.end_utc)));
    push_line(out, &format!("CREATED:{}", format_instant(booking.created_at)));
    push_line(
        out,
        &format!("LAST-MODIFIED:{}", format_instant(booking.updated_at)),
    );
    push_line(
        out,
        &format!(
            "SUMMARY:{}",
            escape_text(&format!("{summary} {}", other.display_name))
        ),
    );
    push_line(out, &format!("DESCRIPTION:{}", escape_text(&description)));
    push_line(out, "STATUS:CONFIRMED");
    push_line(
        out,
        &format!(
            "ORGANIZER;CN={}:mailto:{}",
            quote_param(entry.mentor.display_name.as_ref()),
            entry.mentor.email
        ),
    );
    push_line(
        out,
        &format!(
            "ATTENDEE;CN={}:mailto:{}",
            quote_param(entry.learner.display_name.as_ref()),
            entry.learner.email
        ),
    );
    push_line(out, "BEGIN:VALARM");
    push_line(out, "ACTION:DISPLAY");
    push_line(out, "TRIGGER:-PT30M");
    push_line(out, "DESCRIPTION:Mentoring session starting soon");
    push_line(out, "END:VALARM");
    push_line(out, "END:VEVENT");
}

/// Render a complete `VCALENDAR` document with CRLF line endings.
///
/// # Examples
/// ```
/// use chrono::Utc;
/// use mentorship::domain::render_calendar;
///
/// let ics = render_calendar("Ada", &[], "mentorship.local", Utc::now());
/// assert!(ics.starts_with("BEGIN:VCALENDAR\r\n"));
/// assert!(ics.ends_with("END:VCALENDAR\r\n"));
/// ```
#[must_use]
pub fn render_calendar(
    owner: &str,
    entries: &[CalendarEntry<'_>],
    domain: &str,
    stamp: DateTime<Utc>,
) -> String {
    let mut out = String::new();
    push_line(&mut out, "BEGIN:VCALENDAR");
    push_line(&mut out, "VERSION:2.0");
    push_line(&mut out, &format!("PRODID:{PRODID}"));
    push_line(&mut out, "CALSCALE:GREGORIAN");
    push_line(&mut out, "METHOD:PUBLISH");
    push_line(
        &mut out,
        &format!(
            "X-WR-CALNAME:{}",
            escape_text(&format!("Mentoring sessions - {owner}"))
        ),
    );
    for entry in entries {
        push_event(&mut out, entry, domain, stamp);
    }
    push_line(&mut out, "END:VCALENDAR");
    out
}

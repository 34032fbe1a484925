//! Caption template engine.
//!
//! Renders one (subject, html) pair per recipient from the caption template
//! and the event/sender data. Rendering is a pure function of its inputs:
//! the dispatcher relies on that to pre-render pending rows once, at
//! enqueue time.
//!
//! The caption usually comes from an AI vision model, which brings a few
//! known failure modes this module has to absorb: invented bracket
//! placeholders, the whole text doubled verbatim, and single-line output
//! with no paragraph breaks.

mod layout;

use handlebars::Handlebars;
use regex::Regex;
use serde::Deserialize;
use serde_json::json;
use url::Url;

use crate::prelude::*;

/// "From" persona embedded in the body signature. Distinct from the
/// transport's envelope sender.
#[derive(Clone, Debug, Deserialize)]
pub struct SenderIdentity {
	pub name: String,
	pub department: String,
	#[serde(default)]
	pub contact: String,
}

pub struct RenderInput<'a> {
	pub recipient_name: &'a str,
	pub caption: &'a str,
	pub event_name: &'a str,
	pub event_date: &'a str,
	pub sender: &'a SenderIdentity,
	pub youtube_url: Option<&'a str>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedEmail {
	pub subject: String,
	pub html: String,
}

/// Escape user text for HTML interpolation.
pub fn sanitize_html(input: &str) -> String {
	input
		.replace('<', "&lt;")
		.replace('>', "&gt;")
		.replace('"', "&quot;")
		.replace('\'', "&#x27;")
		.replace('/', "&#x2F;")
}

/// Hosts allowed for the replay link.
const YOUTUBE_HOSTS: [&str; 3] = ["youtube.com", "www.youtube.com", "youtu.be"];

/// An empty URL counts as absent, matching the form semantics upstream.
pub fn is_valid_youtube_url(url: &str) -> bool {
	if url.is_empty() {
		return true;
	}
	match Url::parse(url) {
		Ok(parsed) => {
			parsed.host_str().is_some_and(|host| YOUTUBE_HOSTS.contains(&host.to_lowercase().as_str()))
		}
		Err(_) => false,
	}
}

fn youtube_video_id(url: &str) -> Option<String> {
	let parsed = Url::parse(url).ok()?;
	let host = parsed.host_str()?.to_lowercase();

	if host == "youtu.be" {
		return parsed.path_segments()?.find(|s| !s.is_empty()).map(String::from);
	}
	if host == "youtube.com" || host == "www.youtube.com" {
		return parsed.query_pairs().find(|(k, _)| k == "v").map(|(_, v)| v.into_owned());
	}
	None
}

/// Lowercase with all whitespace removed, for containment checks.
fn squash(s: &str) -> String {
	s.to_lowercase().chars().filter(|c| !c.is_whitespace()).collect()
}

/// The caption doubled itself verbatim: text = A + whitespace + A with A at
/// least 40 chars. Returns the shortest such A.
fn detect_whole_duplication(text: &str) -> Option<&str> {
	let mut seen = 0usize;
	for (idx, ch) in text.char_indices() {
		if seen >= 40 && ch.is_whitespace() {
			let prefix = &text[..idx];
			let suffix = text[idx..].trim_start();
			if suffix.len() == prefix.len() && suffix == prefix {
				return Some(prefix);
			}
		}
		seen += 1;
	}
	None
}

/// Split into sentences at `.`/`!`/`?` followed by whitespace and an
/// uppercase letter, digit, or `[`. The separator whitespace is dropped.
fn split_sentences(text: &str) -> Vec<String> {
	let chars: Vec<(usize, char)> = text.char_indices().collect();
	let mut out = Vec::new();
	let mut start = 0usize;
	let mut i = 0usize;

	while i < chars.len() {
		let (idx, ch) = chars[i];
		if matches!(ch, '.' | '!' | '?') {
			let mut j = i + 1;
			while j < chars.len() && chars[j].1.is_whitespace() {
				j += 1;
			}
			if j > i + 1 && j < chars.len() {
				let next = chars[j].1;
				if next.is_ascii_uppercase() || next.is_ascii_digit() || next == '[' {
					let piece = text[start..idx + ch.len_utf8()].trim();
					if !piece.is_empty() {
						out.push(piece.to_string());
					}
					start = chars[j].0;
					i = j;
					continue;
				}
			}
		}
		i += 1;
	}

	let tail = text[start..].trim();
	if !tail.is_empty() {
		out.push(tail.to_string());
	}
	out
}

pub struct TemplateEngine {
	handlebars: Handlebars<'static>,
	placeholder_re: Regex,
	ws_run_re: Regex,
	para_split_re: Regex,
	closing_break_re: Regex,
	closing_split_re: Regex,
	closing_presence_re: Regex,
	comma_re: Regex,
	phone_re: Regex,
}

impl TemplateEngine {
	pub fn new() -> ClResult<Self> {
		let mut handlebars = Handlebars::new();
		handlebars.set_strict_mode(true);

		for (name, template) in [
			("document", layout::DOCUMENT),
			("signature", layout::SIGNATURE),
			("closing_block", layout::CLOSING_BLOCK),
			("default_body", layout::DEFAULT_BODY),
			("video_card", layout::VIDEO_CARD),
			("video_link", layout::VIDEO_LINK),
		] {
			handlebars
				.register_template_string(name, template)
				.map_err(|e| Error::ConfigError(format!("bad template '{}': {}", name, e)))?;
		}

		let compile =
			|pattern: &str| Regex::new(pattern).map_err(|e| Error::ConfigError(e.to_string()));

		Ok(Self {
			handlebars,
			// Safety net for placeholders the AI invented
			placeholder_re: compile(r"\[[^\]]{2,40}\]")?,
			ws_run_re: compile(r"\s{2,}")?,
			para_split_re: compile(r"\n{2,}")?,
			closing_break_re: compile(
				r"(?i)([.!?])\s+(salam\s+hormat|hormat\s+kami|hormat\s+saya)\b",
			)?,
			closing_split_re: compile(
				r"(?i)(?:^|\n{2,})(?:salam\s+hormat|hormat\s+kami|hormat\s+saya)\b",
			)?,
			closing_presence_re: compile(r"(?i)\b(hormat\s+kami|salam\s+hormat|hormat\s+saya)\b")?,
			comma_re: compile(r",\s+")?,
			phone_re: compile(r"(.+?)\s+(\+?\d[\d\s-]{7,})$")?,
		})
	}

	fn render_block(&self, name: &str, data: &serde_json::Value) -> ClResult<String> {
		self.handlebars
			.render(name, data)
			.map_err(|e| Error::Internal(format!("template '{}' render: {}", name, e)))
	}

	/// Substitute recognized placeholder aliases, strip everything bracketed
	/// that remains, and collapse the whitespace left behind.
	fn personalize(&self, caption: &str, recipient_name: &str, sender: &SenderIdentity) -> String {
		let dept_or_name: &str =
			if sender.department.is_empty() { &sender.name } else { &sender.department };

		let mut text = caption.to_string();
		for (token, value) in [
			("[Nama]", recipient_name),
			("[Nama Pengirim]", sender.name.as_str()),
			("[Nama Penyelenggara/Tim]", sender.name.as_str()),
			("[Tim Penyelenggara]", sender.name.as_str()),
			("[Nama Instansi/Tim Penyelenggara]", dept_or_name),
			("[Nama Penyelenggara/Instansi]", sender.name.as_str()),
			("[Nama Instansi]", dept_or_name),
			("[Panitia/Instansi]", sender.name.as_str()),
			("[Panitia/Institusi]", sender.name.as_str()),
			("[Panitia]", sender.name.as_str()),
			("[Instansi]", dept_or_name),
			("[Instansi/Unit]", sender.department.as_str()),
			("[Kontak]", sender.contact.as_str()),
		] {
			text = text.replace(token, value);
		}

		let text = self.placeholder_re.replace_all(&text, "");
		let text = self.ws_run_re.replace_all(&text, " ");
		text.trim().to_string()
	}

	/// Re-insert a paragraph break between a sentence end and a closing
	/// phrase, so the closing splitter can find it again.
	fn insert_closing_break(&self, text: &str) -> String {
		self.closing_break_re.replace_all(text, "${1}\n\n${2}").into_owned()
	}

	/// Collapse AI duplication artifacts: the whole text repeated verbatim,
	/// or an even number of duplicated paragraph blocks.
	fn normalize_caption(&self, text: &str) -> String {
		let raw = text.replace("\r\n", "\n");
		let raw = raw.trim();
		if raw.is_empty() {
			return String::new();
		}

		if let Some(first) = detect_whole_duplication(raw) {
			return self.insert_closing_break(first.trim());
		}

		let blocks: Vec<&str> =
			self.para_split_re.split(raw).map(str::trim).filter(|s| !s.is_empty()).collect();
		if blocks.len() >= 4 && blocks.len() % 2 == 0 {
			let half = blocks.len() / 2;
			if blocks[..half] == blocks[half..] {
				return self.insert_closing_break(&blocks[..half].join("\n\n"));
			}
		}

		self.insert_closing_break(raw)
	}

	/// Split off a closing found at a paragraph boundary past roughly the
	/// last third of the text. The first candidate decides: an opening
	/// closing-phrase (index 0) means no split.
	fn split_caption_closing(&self, text: &str) -> (String, String) {
		if let Some(m) = self.closing_split_re.find(text) {
			let index = m.start();
			if (index as f64) >= (text.len() as f64) * 0.35 {
				return (text[..index].trim().to_string(), text[index..].trim().to_string());
			}
		}
		(text.to_string(), String::new())
	}

	/// Reformat a caption-supplied closing: one clause per line, sender name
	/// and contact appended only when not already present.
	fn format_closing_html(
		&self,
		closing_text: &str,
		sender_name: &str,
		sender_contact: &str,
	) -> ClResult<String> {
		if closing_text.is_empty() {
			return Ok(String::new());
		}

		let name = sender_name.trim();
		let contact = sender_contact.trim();
		let squashed_closing = squash(closing_text);
		let has_name_in_closing = !name.is_empty() && squashed_closing.contains(&squash(name));
		let has_contact_in_closing =
			!contact.is_empty() && squashed_closing.contains(&squash(contact));

		let normalized = closing_text.replace("\r\n", "\n");
		let normalized = self.comma_re.replace_all(&normalized, ",\n");
		let normalized = self.phone_re.replace(&normalized, "${1}\n${2}");
		let normalized = normalized.trim();

		let with_name = if !has_name_in_closing && !name.is_empty() {
			format!("{}\n{}", normalized, name)
		} else {
			normalized.to_string()
		};
		let with_contact = if !has_contact_in_closing && !contact.is_empty() {
			format!("{}\n{}", with_name, contact)
		} else {
			with_name
		};

		let safe_closing = sanitize_html(&with_contact).replace('\n', "<br/>");
		self.render_block("closing_block", &json!({ "closing": safe_closing }))
	}

	/// Blank-line blocks become paragraphs; single-line text is grouped two
	/// sentences at a time.
	fn format_caption_paragraphs(&self, text: &str) -> String {
		let normalized = text.replace("\r\n", "\n");
		let normalized = normalized.trim();
		if normalized.is_empty() {
			return String::new();
		}

		let paragraphs: Vec<String> = if normalized.contains('\n') {
			self.para_split_re
				.split(normalized)
				.map(str::trim)
				.filter(|s| !s.is_empty())
				.map(String::from)
				.collect()
		} else {
			let sentences = split_sentences(normalized);
			let mut grouped = Vec::new();
			let mut buffer: Vec<String> = Vec::new();
			for sentence in sentences {
				buffer.push(sentence);
				if buffer.len() == 2 {
					grouped.push(buffer.join(" "));
					buffer.clear();
				}
			}
			if !buffer.is_empty() {
				grouped.push(buffer.join(" "));
			}
			if grouped.is_empty() { vec![normalized.to_string()] } else { grouped }
		};

		paragraphs
			.iter()
			.map(|p| {
				format!(
					"<p style=\"margin-bottom: 14px; white-space: normal;\">{}</p>",
					sanitize_html(p).replace('\n', "<br/>")
				)
			})
			.collect::<Vec<_>>()
			.join("\n")
	}

	fn build_youtube_html(&self, youtube_url: Option<&str>) -> ClResult<String> {
		let Some(url) = youtube_url.filter(|u| !u.is_empty()) else {
			return Ok(String::new());
		};

		match youtube_video_id(url) {
			Some(id) => self.render_block(
				"video_card",
				&json!({
					"url": url,
					"thumbnail": format!("https://img.youtube.com/vi/{}/hqdefault.jpg", id),
				}),
			),
			None => self.render_block("video_link", &json!({ "url": url })),
		}
	}

	/// Render the final (subject, html) pair for one recipient.
	pub fn render(&self, input: &RenderInput) -> ClResult<RenderedEmail> {
		let personalized_raw =
			self.personalize(input.caption, input.recipient_name, input.sender);
		let personalized = self.normalize_caption(&personalized_raw);

		let safe_event_name = sanitize_html(input.event_name);
		let safe_event_date = sanitize_html(input.event_date);
		let safe_recipient_name = sanitize_html(input.recipient_name);
		let safe_sender_name = sanitize_html(&input.sender.name);
		let safe_sender_department = sanitize_html(&input.sender.department);
		let safe_sender_contact = sanitize_html(&input.sender.contact);

		let has_custom_caption = !personalized.trim().is_empty();
		let youtube_url = input.youtube_url.filter(|u| !u.is_empty());
		let caption_contains_url = youtube_url.is_some_and(|u| personalized.contains(u));
		let caption_has_closing = self.closing_presence_re.is_match(&personalized);

		let youtube_html = self.build_youtube_html(youtube_url)?;
		let (body_text, closing_text) = self.split_caption_closing(&personalized);
		let formatted_caption = self.format_caption_paragraphs(&body_text);
		let formatted_closing =
			self.format_closing_html(&closing_text, &input.sender.name, &input.sender.contact)?;

		let signature = self.render_block(
			"signature",
			&json!({
				"sender_name": safe_sender_name,
				"sender_department": safe_sender_department,
				"sender_contact": safe_sender_contact,
			}),
		)?;

		let body = if has_custom_caption {
			let mut parts = vec![formatted_caption];
			if youtube_url.is_some() && !caption_contains_url {
				parts.push(youtube_html);
			}
			if !formatted_closing.is_empty() {
				parts.push(formatted_closing);
			} else if !caption_has_closing {
				parts.push(signature);
			}
			parts.join("\n")
		} else {
			let default_body = self.render_block(
				"default_body",
				&json!({
					"recipient_name": safe_recipient_name,
					"event_name": safe_event_name,
					"event_date": safe_event_date,
				}),
			)?;
			[default_body, layout::STANDARD_TAIL.to_string(), youtube_html, signature].join("\n")
		};

		let html = self.render_block("document", &json!({ "body": body }))?;

		Ok(RenderedEmail { subject: format!("E-Sertifikat: {}", input.event_name), html })
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn engine() -> TemplateEngine {
		TemplateEngine::new().unwrap()
	}

	fn sender() -> SenderIdentity {
		SenderIdentity {
			name: "Budi Santoso".into(),
			department: "Divisi Humas".into(),
			contact: "+62 812-3456-7890".into(),
		}
	}

	fn render_with_caption(caption: &str) -> RenderedEmail {
		let sender = sender();
		engine()
			.render(&RenderInput {
				recipient_name: "Ana Wijaya",
				caption,
				event_name: "Webinar Nasional",
				event_date: "Senin, 12 Januari 2026",
				sender: &sender,
				youtube_url: None,
			})
			.unwrap()
	}

	#[test]
	fn test_rendering_is_deterministic() {
		let caption = "Yth [Nama], terima kasih telah hadir. Salam hormat, [Nama Pengirim]";
		let a = render_with_caption(caption);
		let b = render_with_caption(caption);
		assert_eq!(a.subject, b.subject);
		assert_eq!(a.html, b.html);
	}

	#[test]
	fn test_name_token_substituted_and_unknown_stripped() {
		let out = render_with_caption(
			"Yth [Nama], terima kasih atas kehadiran Anda dalam acara kami. [Foo]",
		);
		assert!(out.html.contains("Ana Wijaya"));
		assert!(!out.html.contains("[Foo]"));
		assert!(!out.html.contains("[Nama]"));
	}

	#[test]
	fn test_sender_aliases_resolve_to_same_values() {
		let out = render_with_caption(
			"Diselenggarakan oleh [Panitia] bersama [Tim Penyelenggara] dari [Instansi/Unit].",
		);
		assert!(out.html.contains("Budi Santoso"));
		assert!(out.html.contains("Divisi Humas"));
		assert!(!out.html.contains('['));
	}

	#[test]
	fn test_script_tag_is_escaped() {
		let sender = sender();
		let out = engine()
			.render(&RenderInput {
				recipient_name: "<script>alert('x')</script>",
				caption: "Halo [Nama], terima kasih.",
				event_name: "Acara <script>",
				event_date: "Senin",
				sender: &sender,
				youtube_url: None,
			})
			.unwrap();
		assert!(!out.html.contains("<script>"));
		assert!(out.html.contains("&lt;script&gt;"));
	}

	#[test]
	fn test_whole_text_duplication_collapsed() {
		let msg = "Terima kasih atas partisipasi Anda dalam acara webinar nasional kami tahun ini.";
		let out = render_with_caption(&format!("{}\n\n{}", msg, msg));
		assert_eq!(out.html.matches("partisipasi Anda dalam acara webinar").count(), 1);
	}

	#[test]
	fn test_paragraph_block_duplication_collapsed() {
		// Duplicates survive the whitespace collapse only via explicit blocks,
		// so feed normalize_caption directly.
		let eng = engine();
		let text = "Para satu.\n\nPara dua.\n\nPara satu.\n\nPara dua.";
		let normalized = eng.normalize_caption(text);
		assert_eq!(normalized, "Para satu.\n\nPara dua.");
	}

	#[test]
	fn test_video_link_not_duplicated_when_caption_has_url() {
		let url = "https://youtu.be/abc123xyz";
		let sender = sender();
		let caption = format!(
			"Terima kasih telah hadir dalam acara kami. Siaran ulang: {}",
			url
		);
		let out = engine()
			.render(&RenderInput {
				recipient_name: "Ana",
				caption: &caption,
				event_name: "Webinar",
				event_date: "Senin",
				sender: &sender,
				youtube_url: Some(url),
			})
			.unwrap();
		// The caption already carries the URL, so no replay block is appended.
		assert!(!out.html.contains("Buka Siaran Ulang"));
		assert!(!out.html.contains("img.youtube.com"));
	}

	#[test]
	fn test_video_card_appended_when_caption_lacks_url() {
		let url = "https://www.youtube.com/watch?v=abc123xyz";
		let sender = sender();
		let out = engine()
			.render(&RenderInput {
				recipient_name: "Ana",
				caption: "Terima kasih telah hadir dalam acara kami.",
				event_name: "Webinar",
				event_date: "Senin",
				sender: &sender,
				youtube_url: Some(url),
			})
			.unwrap();
		assert!(out.html.contains("img.youtube.com/vi/abc123xyz/hqdefault.jpg"));
		assert!(out.html.contains("Buka Siaran Ulang"));
	}

	#[test]
	fn test_empty_caption_falls_back_to_default_body() {
		let out = render_with_caption("");
		assert!(out.html.contains("Yth. Bapak/Ibu <strong>Ana Wijaya</strong>"));
		assert!(out.html.contains("e-sertifikat"));
		assert!(out.html.contains("Hormat kami,"));
	}

	#[test]
	fn test_caption_of_only_unknown_placeholders_falls_back() {
		let out = render_with_caption("[Tanggal Acara] [Nomor Sertifikat]");
		assert!(out.html.contains("Salam hangat,"));
	}

	#[test]
	fn test_closing_split_and_signature_suppressed() {
		let eng = engine();
		let sender = sender();
		let caption = "Terima kasih atas partisipasi Bapak/Ibu dalam acara webinar kami. \
			Semoga materi yang disampaikan bermanfaat untuk pekerjaan Anda. \
			Salam hormat, Panitia Webinar";
		let out = eng
			.render(&RenderInput {
				recipient_name: "Ana",
				caption,
				event_name: "Webinar",
				event_date: "Senin",
				sender: &sender,
				youtube_url: None,
			})
			.unwrap();
		// The caption's own closing is used; the generated "Hormat kami,"
		// footer must not appear on top of it.
		assert!(out.html.contains("Salam hormat"));
		assert!(!out.html.contains("Hormat kami,"));
		// name appended to the closing (not present in the closing text)
		assert!(out.html.contains("Budi Santoso"));
	}

	#[test]
	fn test_closing_not_split_when_too_early() {
		let eng = engine();
		let text = "Salam hormat, kami mengundang Anda untuk hadir pada acara berikutnya yang akan datang segera.";
		let (body, closing) = eng.split_caption_closing(text);
		assert_eq!(body, text);
		assert!(closing.is_empty());
	}

	#[test]
	fn test_sentence_grouping_two_per_paragraph() {
		let eng = engine();
		let html = eng.format_caption_paragraphs(
			"Kalimat satu. Kalimat dua. Kalimat tiga. Kalimat empat. Kalimat lima.",
		);
		assert_eq!(html.matches("<p style=").count(), 3);
		assert!(html.contains("Kalimat satu. Kalimat dua."));
		assert!(html.contains("Kalimat lima."));
	}

	#[test]
	fn test_blank_line_blocks_become_paragraphs() {
		let eng = engine();
		let html = eng.format_caption_paragraphs("Blok satu.\n\nBlok dua.");
		assert_eq!(html.matches("<p style=").count(), 2);
	}

	#[test]
	fn test_closing_reformat_splits_clauses_and_phone() {
		let eng = engine();
		let html = eng
			.format_closing_html("Hormat kami, Panitia Acara +62 811-2222-3333", "Panitia Acara", "")
			.unwrap();
		assert!(html.contains("Hormat kami,<br/>"));
		assert!(html.contains("+62 811-2222-3333"));
		// name already contained, not appended twice
		assert_eq!(html.matches("Panitia Acara").count(), 1);
	}

	#[test]
	fn test_youtube_url_validation() {
		assert!(is_valid_youtube_url(""));
		assert!(is_valid_youtube_url("https://youtu.be/abc"));
		assert!(is_valid_youtube_url("https://www.youtube.com/watch?v=abc"));
		assert!(is_valid_youtube_url("https://youtube.com/watch?v=abc"));
		assert!(!is_valid_youtube_url("https://example.com/watch?v=abc"));
		assert!(!is_valid_youtube_url("not a url"));
		assert!(!is_valid_youtube_url("https://evil.youtube.com.example.com/x"));
	}

	#[test]
	fn test_subject_carries_event_name() {
		let out = render_with_caption("Terima kasih.");
		assert_eq!(out.subject, "E-Sertifikat: Webinar Nasional");
	}
}

// vim: ts=4

//! Handlebars blocks for the email HTML.
//!
//! Every interpolated value is escaped by the caller before rendering, so
//! the blocks use triple-stache throughout. The structural HTML here is
//! engine-generated and never contains user input directly.

/// Standalone HTML document wrapping the assembled body.
pub(crate) const DOCUMENT: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
</head>
<body style="font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif; line-height: 1.8; color: #333; max-width: 650px; margin: 0 auto; padding: 20px;">
{{{body}}}
</body>
</html>
"#;

/// Generated signature footer, used when the caption carries no closing.
pub(crate) const SIGNATURE: &str = r#"<p style="margin-bottom: 8px;">Hormat kami,</p>

<div style="margin-top: 24px; padding-top: 16px; border-top: 1px solid #eee;">
    <p style="margin: 0; font-weight: bold;">{{{sender_name}}}</p>
    <p style="margin: 4px 0; color: #555;">{{{sender_department}}}</p>
    {{#if sender_contact}}<p style="margin: 4px 0; color: #555;">{{{sender_contact}}}</p>{{/if}}
</div>
"#;

/// Box holding a reformatted closing taken from the caption itself.
pub(crate) const CLOSING_BLOCK: &str = r#"<div style="margin-top: 24px; padding-top: 16px; border-top: 1px solid #eee;">
    <p style="margin: 0; color: #333;">{{{closing}}}</p>
</div>
"#;

/// Canonical thank-you letter used when no usable caption exists.
pub(crate) const DEFAULT_BODY: &str = r#"<p style="margin-bottom: 16px;">Yth. Bapak/Ibu <strong>{{{recipient_name}}}</strong>,</p>

<p style="margin-bottom: 16px;">Salam hangat,</p>

<p style="margin-bottom: 16px;">
    Kami dari Panitia <strong>{{{event_name}}}</strong> mengucapkan terima kasih yang sebesar-besarnya atas partisipasi Anda dalam acara kami yang telah dilaksanakan pada hari <strong>{{{event_date}}}</strong>.
</p>

<p style="margin-bottom: 16px;">
    Kehadiran Bapak/Ibu sangat berarti dalam mendukung keberhasilan kegiatan ini. Semoga materi yang diperoleh bermanfaat dan mendukung peningkatan produktivitas kerja.
</p>
"#;

/// Static continuation of the canonical letter. No variables.
pub(crate) const STANDARD_TAIL: &str = r#"<p style="margin-bottom: 16px;">
    Sebagai bentuk apresiasi, bersama dengan email ini kami lampirkan <strong>e-sertifikat</strong> sebagai bukti keikutsertaan Anda.
</p>

<p style="margin-bottom: 16px;">
    Semoga ilmu dan wawasan yang dibagikan oleh para narasumber dapat bermanfaat dalam mendukung tugas dan fungsi Bapak/Ibu.
</p>

<p style="margin-bottom: 16px;">
    Nantikan informasi mengenai webinar dan acara inspiratif kami selanjutnya. Sampai jumpa di lain kesempatan!
</p>
"#;

/// Replay call-to-action with a clickable thumbnail.
pub(crate) const VIDEO_CARD: &str = r#"<div style="margin: 18px 0 20px; padding: 14px; border: 1px solid #e5e7eb; border-radius: 12px; background: #f8fafc;">
    <a href="{{{url}}}" style="display: block; text-decoration: none; color: inherit;">
        <img src="{{{thumbnail}}}" alt="Siaran ulang webinar" style="display: block; width: 100%; max-width: 560px; border-radius: 10px; border: 1px solid #d1d5db; margin: 0 auto;" />
    </a>
    <div style="margin-top: 12px; text-align: center;">
        <a href="{{{url}}}" style="display: inline-block; background: #2563eb; color: #ffffff; text-decoration: none; padding: 10px 16px; border-radius: 8px; font-size: 13px; font-weight: 600;">Buka Siaran Ulang</a>
    </div>
    <p style="margin: 10px 0 0; color: #2563eb; font-size: 12px; text-decoration: underline; word-break: break-all; text-align: center;">{{{url}}}</p>
</div>
"#;

/// Plain replay link for URLs without an extractable video id.
pub(crate) const VIDEO_LINK: &str = r#"<p style="margin-bottom: 16px;">Siaran ulang webinar dapat diakses di sini:<br><a href="{{{url}}}" style="color: #2563eb; text-decoration: underline;">{{{url}}}</a></p>
"#;

// vim: ts=4

use dinoqode_engine::{decode_page, CharsetSource, DecodeError};
use pretty_assertions::assert_eq;

#[test]
fn content_type_charset_is_honoured() {
    let decoded = decode_page(b"<p>caf\xE9</p>", Some("text/html; charset=windows-1252")).unwrap();
    assert_eq!(decoded.html, "<p>café</p>");
    assert_eq!(decoded.encoding_label, "windows-1252");
    assert_eq!(decoded.source, CharsetSource::ContentType);
}

#[test]
fn byte_order_mark_wins_and_is_stripped() {
    let mut bytes = vec![0xEF, 0xBB, 0xBF];
    bytes.extend_from_slice("<p>Ärzte</p>".as_bytes());
    let decoded = decode_page(&bytes, Some("text/html; charset=windows-1252")).unwrap();
    assert_eq!(decoded.html, "<p>Ärzte</p>");
    assert_eq!(decoded.source, CharsetSource::ByteOrderMark);
}

#[test]
fn meta_tag_is_used_without_header_charset() {
    let bytes = b"<html><head><meta charset=\"iso-8859-1\"></head><body>Gr\xFC\xDFe</body></html>";
    let decoded = decode_page(bytes, Some("text/html")).unwrap();
    assert!(decoded.html.contains("Grüße"), "{}", decoded.html);
    assert_eq!(decoded.source, CharsetSource::MetaTag);
}

#[test]
fn header_charset_takes_precedence_over_meta() {
    let bytes = "<meta charset=\"iso-8859-1\"><p>Grüße</p>".as_bytes();
    let decoded = decode_page(bytes, Some("text/html; charset=\"UTF-8\"")).unwrap();
    assert!(decoded.html.contains("Grüße"));
    assert_eq!(decoded.encoding_label, "UTF-8");
}

#[test]
fn undeclared_encoding_is_detected() {
    let decoded = decode_page("<p>Die drei ???</p>".as_bytes(), None).unwrap();
    assert_eq!(decoded.html, "<p>Die drei ???</p>");
    assert_eq!(decoded.source, CharsetSource::Detected);
}

#[test]
fn invalid_bytes_for_declared_encoding_fail() {
    let err = decode_page(b"<p>\xFF\xFE\xFD</p>", Some("text/html; charset=utf-8")).unwrap_err();
    assert_eq!(
        err,
        DecodeError::Malformed {
            encoding: "UTF-8".into()
        }
    );
}

use dinoqode_core::normalize_title;

#[test]
fn episode_marker_becomes_subtitle_separator() {
    assert_eq!(normalize_title("Folge 12 - Finale"), "Folge 12: Finale");
    assert_eq!(normalize_title("Folge 1 - Anfang"), "Folge 1: Anfang");
    assert_eq!(normalize_title("Folge 123 - Ende"), "Folge 123: Ende");
}

#[test]
fn titles_without_marker_are_unchanged() {
    for title in [
        "Symphony No. 5",
        "Folge 12 Finale",
        "Folge - 12",
        "Anti-Held",
        "Rock - Live",
        "",
    ] {
        assert_eq!(normalize_title(title), title);
    }
}

#[test]
fn normalization_is_idempotent() {
    for title in [
        "Folge 12 - Finale",
        "Folge 1 - Folge 2 - Doppel",
        "Symphony No. 5",
        "Teil 3: Folge 45 - Rückkehr - Reprise",
        "Folge 999 - ",
    ] {
        let once = normalize_title(title);
        assert_eq!(normalize_title(&once), once, "not idempotent for {title:?}");
    }
}

#[test]
fn every_episode_marker_is_rewritten() {
    assert_eq!(
        normalize_title("Folge 1 - Folge 2 - Doppel"),
        "Folge 1: Folge 2: Doppel"
    );
}

use vic_wikitext::{extract, find_template, gallery_target, sort_key, GalleryLine};

const CANDIDATE_PAGE: &str = r"=== [[:File:Passer domesticus male (15).jpg|Passer domesticus male (15).jpg]] ===
<noinclude>{{VIC-thumb|Passer domesticus male (15).jpg}}</noinclude>
{{VIC
 |image=Passer domesticus male (15).jpg
 |scope=[[Passer domesticus]] (House Sparrow), male <!-- plumage -->
 |subpage=
 |nominator=--[[User:Alice|Alice]] ([[User talk:Alice|talk]]) 10:02, 3 May 2024 (UTC)
 |review=
*{{s}} Nice. --[[User:Bob|Bob]] 12:00, 4 May 2024 (UTC)
*{{o}} Soft. --[[User:Carol|Carol]] 13:00, 4 May 2024 (UTC)
 |status=promoted
 |category=Animals/Birds
}}
";

#[test]
fn candidate_page_yields_governing_template_with_all_fields() {
    let vic = find_template(CANDIDATE_PAGE, "vic").expect("VIC template present");

    assert_eq!(vic.field("image"), Some("Passer domesticus male (15).jpg"));
    assert_eq!(
        vic.field("scope"),
        Some("[[Passer domesticus]] (House Sparrow), male")
    );
    assert_eq!(vic.field("subpage"), None);
    assert!(vic
        .field("nominator")
        .is_some_and(|n| n.contains("[[User:Alice|Alice]]")));
    let review = vic.field("review").expect("review present");
    assert!(review.starts_with("*{{s}} Nice."));
    assert!(review.ends_with("13:00, 4 May 2024 (UTC)"));
    assert_eq!(vic.field("category"), Some("Animals/Birds"));
}

#[test]
fn nested_vote_templates_are_separate_instances() {
    let names: Vec<_> = extract(CANDIDATE_PAGE)
        .into_iter()
        .map(|t| t.name)
        .collect();
    assert_eq!(names, vec!["VIC-thumb", "VIC", "s", "o"]);
}

#[test]
fn scope_of_candidate_sorts_and_targets_gallery() {
    let vic = find_template(CANDIDATE_PAGE, "VIC").unwrap();
    let scope = vic.field("scope").unwrap();
    assert_eq!(sort_key(scope), "PASSER DOMESTICUS (HOUSE SPARROW), MALE");
    assert_eq!(gallery_target(scope), "Passer domesticus");
}

#[test]
fn staging_gallery_lines_expose_move_markers() {
    let staging = "<gallery>\nFile:A.jpg|Plain caption\nFile:B.jpg|{{VICbotMove|Beetles|Animals/Insects}}\n</gallery>";
    let moves: Vec<_> = staging
        .lines()
        .filter_map(|line| GalleryLine::parse(line, "VICbotMove"))
        .filter(GalleryLine::is_move)
        .collect();
    assert_eq!(moves.len(), 1);
    assert_eq!(moves[0].filename, "File:B.jpg");
    assert_eq!(moves[0].move_target.as_deref(), Some("Animals/Insects"));
}

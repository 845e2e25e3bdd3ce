use indoc::indoc;
use reswsync::{
    Config, DiagnosticKind, MarkupSource, ProjectItem, ResourceDocument, run, run_directory,
    run_project, traits::Parser,
};
use std::fs;
use std::path::{Path, PathBuf};

const SAVE_BUTTON: &str = indoc! {r#"
    <Page
        xmlns="http://schemas.microsoft.com/winfx/2006/xaml/presentation"
        xmlns:x="http://schemas.microsoft.com/winfx/2006/xaml">
        <Button x:Uid="Save" Content="Save" ToolTipService.ToolTip="Save changes"/>
    </Page>
"#};

const GREETING: &str = indoc! {r#"
    <Page xmlns:x="http://schemas.microsoft.com/winfx/2006/xaml">
        <TextBlock x:Uid="Greeting" Text="Hello"/>
    </Page>
"#};

const SETTINGS: &str = indoc! {r#"
    <Page xmlns:x="http://schemas.microsoft.com/winfx/2006/xaml">
        <ToggleSwitch x:Uid="Wifi" Header="Wi-Fi"/>
        <TextBox x:Uid="Name" PlaceholderText="Your name"/>
    </Page>
"#};

const RESW_WITH_HEADER: &str = indoc! {r#"
    <?xml version="1.0" encoding="utf-8"?>
    <root>
      <!-- Microsoft ResX Schema, Version 2.0 -->
      <xsd:schema id="root" xmlns="" xmlns:xsd="http://www.w3.org/2001/XMLSchema">
        <xsd:element name="root" />
      </xsd:schema>
      <resheader name="resmimetype">
        <value>text/microsoft-resx</value>
      </resheader>
      <data name="Greeting.Text" xml:space="preserve">
        <value>Hello</value>
        <comment />
      </data>
    </root>
"#};

fn write_file(dir: &Path, relative: &str, contents: &str) -> PathBuf {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_end_to_end_save_button() {
    let dir = tempfile::tempdir().unwrap();
    let resw = write_file(dir.path(), "Strings/en-US/Resources.resw", "<root></root>");

    let report = run(
        &Config::default(),
        &[MarkupSource::new("MainPage.xaml", SAVE_BUTTON)],
        &[&resw],
    );

    assert_eq!(report.total_added, 2);
    assert!(report.failures.is_empty());
    assert_eq!(report.added_for(&resw), 2);

    let doc = ResourceDocument::read_from(&resw).unwrap();
    let entries: Vec<_> = doc
        .entries()
        .map(|e| (e.name.as_str(), e.value.as_str(), e.comment.as_deref()))
        .collect();
    assert_eq!(
        entries,
        vec![
            ("Save.Content", "Save", Some("")),
            ("Save.ToolTipService.ToolTip", "Save changes", Some("")),
        ]
    );
    let text = fs::read_to_string(&resw).unwrap();
    assert_eq!(text.matches("xml:space=\"preserve\"").count(), 2);
}

#[test]
fn test_second_run_adds_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let resw = write_file(dir.path(), "Resources.resw", RESW_WITH_HEADER);
    let sources = vec![
        MarkupSource::new("MainPage.xaml", SAVE_BUTTON),
        MarkupSource::new("Home.xaml", GREETING),
    ];

    let first = run(&Config::default(), &sources, &[&resw]);
    assert_eq!(first.total_added, 2);
    let after_first = fs::read(&resw).unwrap();

    let second = run(&Config::default(), &sources, &[&resw]);
    assert_eq!(second.total_added, 0);
    assert!(second.changed_files.is_empty());
    assert_eq!(fs::read(&resw).unwrap(), after_first);
}

#[test]
fn test_complete_table_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let resw = write_file(dir.path(), "Resources.resw", RESW_WITH_HEADER);

    let report = run(
        &Config::default(),
        &[MarkupSource::new("Home.xaml", GREETING)],
        &[&resw],
    );

    assert_eq!(report.total_added, 0);
    assert_eq!(report.added_for(&resw), 0);
    assert!(report.changed_files.is_empty());
    assert_eq!(fs::read_to_string(&resw).unwrap(), RESW_WITH_HEADER);
}

#[test]
fn test_untouched_content_survives_merge() {
    let dir = tempfile::tempdir().unwrap();
    let resw = write_file(dir.path(), "Resources.resw", RESW_WITH_HEADER);

    run(
        &Config::default(),
        &[MarkupSource::new("Settings.xaml", SETTINGS)],
        &[&resw],
    );

    let text = fs::read_to_string(&resw).unwrap();
    let close = RESW_WITH_HEADER.rfind("</root>").unwrap();
    assert!(text.starts_with(&RESW_WITH_HEADER[..close]));
    assert!(text.contains("  <data name=\"Wifi.Header\" xml:space=\"preserve\">\n"));
    assert!(text.ends_with(concat!(
        "  <data name=\"Name.PlaceholderText\" xml:space=\"preserve\">\n",
        "    <value>Your name</value>\n",
        "    <comment></comment>\n",
        "  </data>\n",
        "</root>\n",
    )));
}

#[test]
fn test_malformed_markup_is_isolated() {
    let dir = tempfile::tempdir().unwrap();
    let resw = write_file(dir.path(), "Resources.resw", "<root>\n</root>\n");
    let sources = vec![
        MarkupSource::new("Home.xaml", GREETING),
        MarkupSource::new("Broken.xaml", "<Page><TextBlock Text=\"oops\"></Page>"),
        MarkupSource::new("Settings.xaml", SETTINGS),
    ];

    let report = run(&Config::default(), &sources, &[&resw]);

    assert_eq!(report.total_added, 3);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].source, "Broken.xaml");
    assert_eq!(report.failures[0].kind, DiagnosticKind::Parse);

    let doc = ResourceDocument::read_from(&resw).unwrap();
    assert!(doc.contains("Greeting.Text"));
    assert!(doc.contains("Wifi.Header"));
    assert!(doc.contains("Name.PlaceholderText"));
}

#[test]
fn test_collision_is_reported_and_first_value_kept() {
    let dir = tempfile::tempdir().unwrap();
    let resw = write_file(dir.path(), "Resources.resw", "<root/>");
    let goodbye = indoc! {r#"
        <Page xmlns:x="http://schemas.microsoft.com/winfx/2006/xaml">
            <TextBlock x:Uid="Greeting" Text="Goodbye"/>
        </Page>
    "#};

    let report = run(
        &Config::default(),
        &[
            MarkupSource::new("Home.xaml", GREETING),
            MarkupSource::new("Exit.xaml", goodbye),
        ],
        &[&resw],
    );

    assert_eq!(report.total_added, 1);
    assert_eq!(report.failures.len(), 1);
    let failure = &report.failures[0];
    assert_eq!(failure.kind, DiagnosticKind::Validation);
    assert_eq!(failure.source, "Exit.xaml");
    assert_eq!(failure.line, Some(2));

    let doc = ResourceDocument::read_from(&resw).unwrap();
    assert_eq!(doc.get("Greeting.Text").unwrap().value, "Hello");
}

#[test]
fn test_empty_identifier_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let resw = write_file(dir.path(), "Resources.resw", "<root/>");
    let markup = r#"<Page xmlns:x="http://schemas.microsoft.com/winfx/2006/xaml"><TextBlock x:Uid="" Text="Hello"/></Page>"#;

    let report = run(
        &Config::default(),
        &[MarkupSource::new("Home.xaml", markup)],
        &[&resw],
    );

    assert!(report.nothing_to_do);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].kind, DiagnosticKind::Validation);
    assert_eq!(fs::read_to_string(&resw).unwrap(), "<root/>");
}

#[test]
fn test_bad_target_does_not_stop_others() {
    let dir = tempfile::tempdir().unwrap();
    let missing_root = write_file(dir.path(), "a/Resources.resw", "<resources/>");
    let broken = write_file(dir.path(), "b/Resources.resw", "<root><data></root>");
    let absent = dir.path().join("c/Resources.resw");
    let good = write_file(dir.path(), "d/Resources.resw", "<root></root>");

    let report = run(
        &Config::default(),
        &[MarkupSource::new("Home.xaml", GREETING)],
        &[&missing_root, &broken, &absent, &good],
    );

    assert_eq!(report.total_added, 1);
    assert_eq!(report.added_for(&good), 1);
    let kinds: Vec<_> = report.failures.iter().map(|f| f.kind).collect();
    assert_eq!(
        kinds,
        vec![
            DiagnosticKind::Structural,
            DiagnosticKind::Parse,
            DiagnosticKind::Io,
        ]
    );
    assert_eq!(fs::read_to_string(&missing_root).unwrap(), "<resources/>");
}

#[test]
fn test_trailing_junk_target_is_left_alone() {
    let dir = tempfile::tempdir().unwrap();
    let junk = write_file(dir.path(), "Resources.resw", "<root></root> junk");

    let report = run(
        &Config::default(),
        &[MarkupSource::new("Home.xaml", GREETING)],
        &[&junk],
    );

    assert_eq!(report.total_added, 0);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].kind, DiagnosticKind::Parse);
    assert_eq!(fs::read_to_string(&junk).unwrap(), "<root></root> junk");
}

#[test]
fn test_markup_with_trailing_text_is_isolated() {
    let dir = tempfile::tempdir().unwrap();
    let resw = write_file(dir.path(), "Resources.resw", "<root/>");
    let junk = format!("{GREETING} trailing junk");

    let report = run(
        &Config::default(),
        &[
            MarkupSource::new("Junk.xaml", junk),
            MarkupSource::new("Settings.xaml", SETTINGS),
        ],
        &[&resw],
    );

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].source, "Junk.xaml");
    assert_eq!(report.failures[0].kind, DiagnosticKind::Parse);
    let doc = ResourceDocument::read_from(&resw).unwrap();
    assert!(!doc.contains("Greeting.Text"));
}

#[test]
fn test_every_target_receives_keys() {
    let dir = tempfile::tempdir().unwrap();
    let en = write_file(dir.path(), "Strings/en-US/Resources.resw", "<root/>");
    let de = write_file(
        dir.path(),
        "Strings/de-DE/Resources.resw",
        "<root>\n  <data name=\"Greeting.Text\" xml:space=\"preserve\"><value>Hallo</value></data>\n</root>",
    );

    let report = run(
        &Config::default(),
        &[MarkupSource::new("Home.xaml", GREETING)],
        &[&en, &de],
    );

    assert_eq!(report.total_added, 1);
    assert_eq!(report.added_for(&en), 1);
    assert_eq!(report.added_for(&de), 0);
    let de_doc = ResourceDocument::read_from(&de).unwrap();
    assert_eq!(de_doc.get("Greeting.Text").unwrap().value, "Hallo");
}

#[test]
fn test_dry_run_reports_without_writing() {
    let dir = tempfile::tempdir().unwrap();
    let resw = write_file(dir.path(), "Resources.resw", "<root></root>");

    let report = run(
        &Config::default().with_dry_run(true),
        &[MarkupSource::new("MainPage.xaml", SAVE_BUTTON)],
        &[&resw],
    );

    assert_eq!(report.total_added, 2);
    assert_eq!(fs::read_to_string(&resw).unwrap(), "<root></root>");
}

#[test]
fn test_run_project_tree() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let main = write_file(root, "App/Views/MainPage.xaml", SAVE_BUTTON);
    let code_behind = write_file(root, "App/Views/MainPage.xaml.cs", "class MainPage {}");
    let resw = write_file(root, "App/Strings/en-US/Resources.resw", "<root/>");

    let tree = vec![ProjectItem::folder(
        root.join("App"),
        vec![
            ProjectItem::folder(
                root.join("App/Views"),
                vec![ProjectItem::file(&main), ProjectItem::file(&code_behind)],
            ),
            ProjectItem::virtual_folder(vec![ProjectItem::file(&resw)]),
            // listed twice by the host
            ProjectItem::file(&resw),
        ],
    )];

    let report = run_project(&Config::default(), &tree).unwrap();
    assert_eq!(report.total_added, 2);
    assert_eq!(report.changed_files.len(), 1);
    assert!(report.failures.is_empty());
}

#[test]
fn test_run_directory_discovers_files() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write_file(root, "App/Views/MainPage.xaml", SAVE_BUTTON);
    write_file(root, "App/Views/Home.xaml", GREETING);
    write_file(root, "App/Views/Broken.xaml", "<Page>");
    write_file(root, "App/Notes.txt", "<root/>");
    let resw = write_file(root, "App/Strings/en-US/Resources.resw", "<root/>");

    let report = run_directory(&Config::default(), root).unwrap();

    assert_eq!(report.total_added, 3);
    assert_eq!(report.added_for(&resw), 3);
    assert_eq!(report.failures.len(), 1);
    assert!(report.failures[0].source.ends_with("Broken.xaml"));
    assert_eq!(fs::read_to_string(root.join("App/Notes.txt")).unwrap(), "<root/>");
}

#[test]
fn test_report_json() {
    let dir = tempfile::tempdir().unwrap();
    let resw = write_file(dir.path(), "Resources.resw", "<root/>");

    let report = run(
        &Config::default(),
        &[
            MarkupSource::new("Home.xaml", GREETING),
            MarkupSource::new("Broken.xaml", "<Page"),
        ],
        &[&resw],
    );

    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    assert_eq!(json["total_added"], 1);
    assert_eq!(json["changed_files"][0]["added"], 1);
    assert_eq!(json["failures"][0]["kind"], "parse");
    assert_eq!(json["failures"][0]["source"], "Broken.xaml");
}

// Models referenced by a handler may live in several files and directories.
use pretty_assertions::assert_eq;
use serde_json::json;
use swagger_from_routes::annotations::ApiManifest;
use swagger_from_routes::builder::DocumentAssembler;
use swagger_from_routes::config::SwaggerConfig;
use swagger_from_routes::model_converter::SourceModelConverter;
use swagger_from_routes::parser::{AstParser, ParsedFile};
use swagger_from_routes::routes::{play, RouteTable};
use swagger_from_routes::scanner::FileScanner;
use swagger_from_routes::type_resolver::TypeResolver;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const MANIFEST: &str = r#"
classes:
  - name: controllers.Teams$
    api:
      value: /teams
    methods:
      - name: show
        operation:
          response: Team
"#;

fn parsed(name: &str, code: &str) -> ParsedFile {
    ParsedFile {
        path: PathBuf::from(name),
        syntax_tree: syn::parse_file(code).expect("Failed to parse fixture"),
    }
}

fn build(files: Vec<ParsedFile>) -> serde_json::Value {
    let manifest = ApiManifest::from_yaml_str(MANIFEST).unwrap();
    let routes = RouteTable::from_entries(play::parse_str("GET /teams/:id controllers.Teams.show(id: Long)").routes);
    let mut converter = SourceModelConverter::new(TypeResolver::new(files));
    let config = SwaggerConfig::default();

    let document = DocumentAssembler::new(&config, &routes, &mut converter)
        .build(&manifest)
        .unwrap();
    serde_json::to_value(&document).unwrap()
}

#[test]
fn test_cross_file_model_resolution() {
    let teams = parsed(
        "teams.rs",
        r#"
        pub struct Team {
            pub name: String,
            pub members: Vec<crate::people::Member>,
            pub lead: Option<Member>,
        }
        "#,
    );
    let people = parsed(
        "people.rs",
        r#"
        pub struct Member {
            pub name: String,
            /// Back-reference to the member's team.
            pub team: Option<Box<Team>>,
        }
        "#,
    );

    let json = build(vec![teams, people]);

    // The singleton controller is routed through `controllers.Teams$.show`.
    assert_eq!(
        json["paths"]["/teams/{id}"]["get"]["responses"]["200"]["schema"],
        json!({ "$ref": "#/definitions/Team" })
    );
    assert_eq!(
        json["definitions"]["Team"]["properties"]["members"],
        json!({ "type": "array", "items": { "$ref": "#/definitions/Member" } })
    );
    assert_eq!(json["definitions"]["Team"]["required"], json!(["name", "members"]));
    assert_eq!(
        json["definitions"]["Member"]["properties"]["team"],
        json!({ "$ref": "#/definitions/Team" })
    );
    assert_eq!(json["definitions"].as_object().unwrap().len(), 2);
}

#[test]
fn test_models_from_several_directories() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    fs::create_dir_all(root.join("core/models")).unwrap();
    fs::create_dir_all(root.join("people/src")).unwrap();
    fs::write(
        root.join("core/models/team.rs"),
        "pub struct Team { pub name: String, pub lead: Member }",
    )
    .unwrap();
    fs::write(root.join("people/src/member.rs"), "pub struct Member { pub name: String }").unwrap();
    fs::write(root.join("people/src/broken.rs"), "pub struct Broken {").unwrap();

    let scan_result = FileScanner::new(vec![root.join("core"), root.join("people")])
        .scan()
        .unwrap();
    assert_eq!(scan_result.rust_files.len(), 3);

    let files: Vec<ParsedFile> = AstParser::parse_files(&scan_result.rust_files)
        .into_iter()
        .filter_map(Result::ok)
        .collect();
    assert_eq!(files.len(), 2);

    let json = build(files);
    let mut names: Vec<&String> = json["definitions"].as_object().unwrap().keys().collect();
    names.sort();
    assert_eq!(names, vec!["Member", "Team"]);
}

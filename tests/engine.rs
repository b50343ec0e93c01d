use typeserve::routes::{Method, RoutePlan, ServeConfig};
use typeserve::{ResolveError, Resolver, Synthesizer, TsSource};

const TYPES: &str = r#"
export interface User {
  id: string;
  email: string;
  age: number;
  tags?: string[];
  createdAt: Date;
}

export enum Status { Active = "active", Inactive = "inactive" }

export interface A { b: B; }
export interface B { a?: A; label: string; }

export type Role = "admin" | "editor";

export interface Member extends User {
  role: Role;
  status: Status;
  manager?: Member;
}
"#;

fn resolver() -> Resolver<TsSource> {
    Resolver::new("it", TsSource::from_sources("/project", [("src/types.ts", TYPES)]))
}

#[test]
fn user_payload_looks_realistic() {
    let mut resolver = resolver();
    let schema = resolver.resolve("User", None).unwrap();

    let id = &schema.properties["id"];
    assert_eq!(id.type_name, "string");
    assert!(!id.is_optional && !id.is_array);
    assert_eq!(schema.properties["email"].type_name, "string");
    assert_eq!(schema.properties["age"].type_name, "number");
    let tags = &schema.properties["tags"];
    assert!(tags.is_array && tags.is_optional);
    assert_eq!(tags.type_name, "string");
    assert!(tags.nested_type.is_none());

    let mut synth = Synthesizer::seeded(2024);
    for _ in 0..20 {
        let user = synth.synthesize(&schema, None);
        let user = user.as_object().unwrap();
        assert!(uuid::Uuid::parse_str(user["id"].as_str().unwrap()).is_ok());
        assert!(user["email"].as_str().unwrap().contains('@'));
        let age = user["age"].as_i64().unwrap();
        assert!((0..=1000).contains(&age));
        assert!(chrono::DateTime::parse_from_rfc3339(user["createdAt"].as_str().unwrap()).is_ok());
        if let Some(tags) = user.get("tags") {
            let tags = tags.as_array().unwrap();
            assert!((1..=3).contains(&tags.len()));
            for tag in tags {
                let word = tag.as_str().unwrap();
                assert!(!word.is_empty() && !word.contains(char::is_whitespace), "{word:?}");
            }
        }
    }
}

#[test]
fn enum_roundtrip() {
    let mut resolver = resolver();
    let status = resolver.resolve("Status", None).unwrap();
    assert!(status.is_enum);
    assert_eq!(status.enum_values.as_deref().unwrap(), ["active", "inactive"]);

    let mut synth = Synthesizer::seeded(1);
    for _ in 0..20 {
        let value = synth.synthesize(&status, None);
        assert!(value == "active" || value == "inactive");
    }
}

#[test]
fn cycles_terminate() {
    let mut resolver = resolver();
    let a = resolver.resolve("A", None).unwrap();
    let b = a.properties["b"].nested_type.as_ref().unwrap();
    assert!(b.properties["a"].nested_type.is_none());

    let value = Synthesizer::seeded(3).synthesize(&a, None);
    assert_eq!(value["b"]["label"].as_str().map(str::is_empty), Some(false));
}

#[test]
fn inherited_and_enum_members() {
    let mut resolver = resolver();
    let member = resolver.resolve("Member", None).unwrap();
    let keys: Vec<_> = member.properties.keys().map(String::as_str).collect();
    assert_eq!(keys, ["role", "status", "manager", "id", "email", "age", "tags", "createdAt"]);
    assert!(member.properties["role"].is_enum);
    assert!(member.properties["manager"].nested_type.is_none());

    let mut synth = Synthesizer::seeded(11);
    for _ in 0..20 {
        let value = synth.synthesize(&member, None);
        assert!(value["role"] == "admin" || value["role"] == "editor");
        assert!(value["status"] == "active" || value["status"] == "inactive");
    }
}

#[test]
fn resolution_is_idempotent_until_reset() {
    let mut resolver = resolver();
    let first = resolver.resolve("User", None).unwrap();
    let second = resolver.resolve("User", None).unwrap();
    assert!(std::sync::Arc::ptr_eq(&first, &second));

    resolver.reset();
    assert!(resolver.cache().is_empty());
    let third = resolver.resolve("User", None).unwrap();
    assert_eq!(*first, *third);
}

#[test]
fn array_counts_are_clamped() {
    let mut resolver = resolver();
    let users = resolver.resolve("User[]", None).unwrap();
    assert!(users.is_array);
    let mut synth = Synthesizer::seeded(5);
    assert_eq!(synth.synthesize(&users, Some(9)).as_array().unwrap().len(), 5);
    assert_eq!(synth.synthesize(&users, Some(0)).as_array().unwrap().len(), 1);
}

#[test]
fn optional_fields_come_and_go() {
    let mut resolver = resolver();
    let schema = resolver.resolve("User", None).unwrap();
    let mut synth = Synthesizer::seeded(77);
    let (mut present, mut absent) = (0, 0);
    for _ in 0..200 {
        let value = synth.synthesize(&schema, None);
        let object = value.as_object().unwrap();
        // every key is declared, every required key is there
        assert!(object.keys().all(|k| schema.properties.contains_key(k)));
        for (key, prop) in &schema.properties {
            if !prop.is_optional {
                assert!(object.contains_key(key), "missing {key}");
            }
        }
        if object.contains_key("tags") {
            present += 1;
        } else {
            absent += 1;
        }
    }
    assert!(present > 0 && absent > 0);
}

#[test]
fn unknown_types_and_files_are_reported() {
    let mut resolver = resolver();
    assert_eq!(
        resolver.resolve("Nope", None).unwrap_err(),
        ResolveError::TypeNotFound { name: "Nope".into(), file: None }
    );
    assert!(matches!(
        resolver.resolve("User", Some("missing.ts")),
        Err(ResolveError::TypeNotFound { file: Some(_), .. })
    ));
    assert!(resolver.resolve("User", Some("./src/types.ts")).is_ok());
}

#[test]
fn route_batch_serves_what_resolves() {
    let config = ServeConfig::from_json(
        r#"{
            "basePath": "/v1",
            "routes": [
                { "path": "/users", "method": "GET", "type": "User[]", "count": 3 },
                { "path": "/ghost", "method": "GET", "type": "Ghost" },
                { "path": "/members", "method": "POST", "type": "Member", "file": "src/types.ts" }
            ]
        }"#,
    )
    .unwrap();
    assert_eq!(config.port, 7002);

    let mut resolver = resolver();
    let plan = RoutePlan::prepare(&config, &mut resolver);
    assert_eq!(plan.ready().count(), 2);
    assert_eq!(plan.failed().count(), 1);

    let mut synth = Synthesizer::seeded(8);
    let users = plan.find(Method::Get, "/v1/users").unwrap();
    assert_eq!(plan.render(users, &mut synth).unwrap().as_array().unwrap().len(), 3);
    let member = plan.find(Method::Post, "/v1/members").unwrap();
    assert!(plan.render(member, &mut synth).unwrap().is_object());
}

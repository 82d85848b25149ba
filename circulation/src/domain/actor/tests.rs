//! Tests for the caller identity model.

use rstest::rstest;

use super::*;

const VALID_ID: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";

#[rstest]
fn user_id_rejects_empty_input() {
    let result = UserId::new("");
    assert!(matches!(result, Err(ActorValidationError::EmptyUserId)));
}

#[rstest]
#[case("not-a-uuid")]
#[case(" 3fa85f64-5717-4562-b3fc-2c963f66afa6 ")]
fn user_id_rejects_malformed_input(#[case] raw: &str) {
    let result = UserId::new(raw);
    assert!(matches!(result, Err(ActorValidationError::InvalidUserId)));
}

#[rstest]
fn user_id_preserves_original_text() {
    let id = UserId::new(VALID_ID).expect("valid id");
    assert_eq!(id.as_ref(), VALID_ID);
    assert_eq!(id.to_string(), VALID_ID);
}

#[rstest]
fn user_id_from_uuid_avoids_round_trip_parse() {
    let uuid = Uuid::parse_str(VALID_ID).expect("valid UUID");
    let id = UserId::from_uuid(uuid);

    assert_eq!(id.as_uuid(), &uuid);
    assert_eq!(id.as_ref(), VALID_ID);
}

#[rstest]
#[case("student", Role::Student)]
#[case("staff", Role::Staff)]
#[case("libstaff", Role::LibStaff)]
#[case("admin", Role::Admin)]
fn role_parses_wire_names(#[case] raw: &str, #[case] expected: Role) {
    let role: Role = raw.parse().expect("known role");
    assert_eq!(role, expected);
    assert_eq!(role.as_str(), raw);
}

#[rstest]
fn role_rejects_unknown_names() {
    let result = "patron".parse::<Role>();
    assert!(matches!(
        result,
        Err(ActorValidationError::UnknownRole { value }) if value == "patron"
    ));
}

#[rstest]
#[case(Role::Student, false, false)]
#[case(Role::Staff, true, false)]
#[case(Role::LibStaff, true, true)]
#[case(Role::Admin, true, true)]
fn role_predicates_follow_privilege(
    #[case] role: Role,
    #[case] staff: bool,
    #[case] librarian: bool,
) {
    assert_eq!(role.is_staff(), staff);
    assert_eq!(role.is_librarian(), librarian);
}

#[rstest]
fn actor_acts_for_self() {
    let actor = Actor::new(UserId::random(), Role::Student);
    let own = actor.id().clone();
    assert!(actor.may_act_for(&own));
}

#[rstest]
fn student_may_not_act_for_another_user() {
    let actor = Actor::new(UserId::random(), Role::Student);
    assert!(!actor.may_act_for(&UserId::random()));
}

#[rstest]
#[case(Role::Staff)]
#[case(Role::LibStaff)]
#[case(Role::Admin)]
fn staff_roles_act_for_any_user(#[case] role: Role) {
    let actor = Actor::new(UserId::random(), role);
    assert!(actor.may_act_for(&UserId::random()));
}

#[rstest]
fn role_serialises_to_lowercase() {
    let value = serde_json::to_value(Role::LibStaff).expect("serialise role");
    assert_eq!(value, serde_json::json!("libstaff"));
}

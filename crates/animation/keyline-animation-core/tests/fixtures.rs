use keyline_animation_core::{
    build_trigger_from_node, parse_animation_json, Animation, AnimationError, AnimationNode,
    AnimationTimelineInstruction, StyleMap, StyleValue,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Expected {
    starting_styles: StyleMap,
    final_styles: StyleMap,
    instructions: Vec<AnimationTimelineInstruction>,
}

fn load_animation(name: &str) -> Result<Animation, AnimationError> {
    let ast: AnimationNode =
        keyline_test_fixtures::animations::load(name).expect("load animation fixture");
    Animation::new(ast)
}

#[test]
fn compiled_fixtures_match_their_expected_output() {
    let mut checked = 0;
    for name in keyline_test_fixtures::animations::keys() {
        let Some(expected) = keyline_test_fixtures::animations::expected::<Expected>(&name)
            .expect("load expected output")
        else {
            continue;
        };
        let animation = load_animation(&name).unwrap_or_else(|e| panic!("{name}: {e}"));
        let out = animation
            .build_timelines(&expected.starting_styles, &expected.final_styles)
            .unwrap_or_else(|e| panic!("{name}: {e}"));
        assert_eq!(out, expected.instructions, "fixture {name}");
        checked += 1;
    }
    assert!(checked >= 4, "expected outputs were skipped");
}

#[test]
fn parallel_group_fixture_splits_into_two_timelines() {
    let animation = load_animation("parallel-group").expect("valid fixture");
    let out = animation
        .build_timelines(&StyleMap::new(), &StyleMap::new())
        .expect("build");
    assert_eq!(out.len(), 2);
    assert_eq!(out[0].delay, 0.0);
    assert_eq!(out[1].delay, 0.0);
    let longest = out.iter().map(|i| i.end_time()).fold(0.0, f64::max);
    assert_eq!(longest, 200.0);
}

#[test]
fn color_collision_fixture_is_rejected() {
    let err = load_animation("color-collision").expect_err("overlapping color writes");
    assert_eq!(err.category(), "validation");
    let messages = err.messages();
    assert_eq!(messages.len(), 1, "{messages:?}");
    assert!(messages[0].contains("color"));
}

#[test]
fn fixture_paths_resolve() {
    let path = keyline_test_fixtures::animations::path("fade-in").expect("known fixture");
    assert!(path.exists(), "{}", path.display());
    assert!(keyline_test_fixtures::animations::json("missing").is_err());
}

#[test]
fn json_text_and_typed_loading_agree() {
    let json = keyline_test_fixtures::animations::json("fade-in").expect("load text");
    let typed: AnimationNode = keyline_test_fixtures::animations::load("fade-in").expect("load typed");
    assert_eq!(parse_animation_json(&json).expect("parse"), typed);
}

#[test]
fn trigger_fixture_drives_state_changes() {
    assert!(keyline_test_fixtures::triggers::keys().contains(&"open-close".to_string()));
    let node: AnimationNode =
        keyline_test_fixtures::triggers::load("open-close").expect("load trigger fixture");
    let trigger = build_trigger_from_node(&node).expect("valid trigger");
    assert_eq!(trigger.name, "openClose");
    assert_eq!(trigger.transitions().len(), 3);

    let close = trigger
        .match_transition("open", "closed")
        .expect("compile")
        .expect("open => closed");
    assert_eq!(close.timelines.len(), 1);
    let tl = &close.timelines[0];
    assert_eq!(tl.duration, 1000.0);
    assert_eq!(tl.keyframes[0]["height"], StyleValue::from("200px"));
    assert_eq!(tl.keyframes[1]["height"], StyleValue::from("100px"));
    assert_eq!(tl.keyframes[1]["opacity"], StyleValue::Number(0.5));

    let open = trigger
        .match_transition("closed", "expanded")
        .expect("compile");
    assert!(open.is_none(), "no transition leads from closed to expanded");

    let reopen = trigger
        .match_transition("closed", "open")
        .expect("compile")
        .expect("closed => open");
    assert_eq!(reopen.timelines[0].duration, 500.0);

    let leave = trigger
        .match_transition("expanded", "void")
        .expect("compile")
        .expect(":leave");
    assert!(leave.is_removal_transition);
    assert!(leave.to_styles.is_empty());
    assert_eq!(leave.total_time(), 200.0);
    assert_eq!(leave.timelines[0].keyframes[0]["easing"], StyleValue::from("ease-in"));
}

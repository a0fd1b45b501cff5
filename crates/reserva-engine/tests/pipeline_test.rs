mod common;

use common::{MockPage, fast_timing, test_request};
use reserva_engine::error::StepError;
use reserva_engine::locator::Locator;
use reserva_engine::pipeline::state::PipelineState;
use reserva_engine::pipeline::{Pipeline, PipelineOutput};
use reserva_engine::selectors::SelectorRegistry;

const NEXT: &str = r#"input.p-button.write[type="submit"][value="다음단계"]"#;

struct Run {
    result: Result<PipelineOutput, StepError>,
    state: PipelineState,
    history: Vec<PipelineState>,
}

async fn run(page: &mut MockPage) -> Run {
    let registry = SelectorRegistry::builtin();
    let timing = fast_timing();
    let request = test_request();
    let mut pipeline = Pipeline::new(page, &registry, &timing);
    let result = pipeline.run(&request).await;
    Run {
        result,
        state: pipeline.state(),
        history: pipeline.history().to_vec(),
    }
}

#[tokio::test]
async fn test_happy_path_reaches_submitted() {
    let mut page = MockPage::site();
    let run = run(&mut page).await;

    let output = run.result.unwrap();
    assert_eq!(run.state, PipelineState::Submitted);
    assert_eq!(run.history, PipelineState::ORDER.to_vec());

    assert_eq!(output.selection.picked, 2);
    assert_eq!(output.selection.picked_hours, vec![9, 10]);
    assert!(!output.selection.is_partial());
    assert_eq!(
        output.reservation_url.as_str(),
        "https://rent.example.org/rent/view.do?facilityId=7&sYear=2025&sMonth=12"
    );

    assert_eq!(page.navigations.len(), 2);
    assert_eq!(page.element("#userId").unwrap().value, "tester");
    assert_eq!(page.element("#userPw").unwrap().value, "secret");
    assert!(page.element("#erntTime_09").unwrap().checked);
    assert!(page.element("#erntTime_10").unwrap().checked);
    assert!(page.element("#checkAgress").unwrap().checked);
    assert_eq!(page.element("#expectNmpr").unwrap().value, "2");
    assert_eq!(page.element("#usePurps").unwrap().value, "테니스");
    // advance control clicked once per stage
    assert_eq!(page.calls_to(&Locator::css(NEXT)).len(), 2);
}

#[tokio::test]
async fn test_dialogs_are_drained_between_stages() {
    let mut page = MockPage::site();
    page.raise_after(Locator::css("button[type='submit']"), "로그인 되었습니다");
    page.raise_after(Locator::css(NEXT), "저장되었습니다");
    page.raise_after(Locator::css(NEXT), "신청하시겠습니까?");

    let run = run(&mut page).await;

    assert!(run.result.is_ok(), "{:?}", run.result.err());
    assert_eq!(run.state, PipelineState::Submitted);
    assert_eq!(page.accepted.first().map(String::as_str), Some("로그인 되었습니다"));
    assert_eq!(page.accepted.len(), 5);
    assert!(page.dialogs.is_empty());
}

#[tokio::test]
async fn test_no_slot_fails_in_selecting_time() {
    let mut page = MockPage::site();
    page.remove(&Locator::css("ul.timetable_list"));
    page.remove(&Locator::css("#erntTime_09"));
    page.remove(&Locator::css("#erntTime_10"));

    let run = run(&mut page).await;

    match run.result {
        Err(StepError::LocatorExhausted { key, .. }) => {
            assert_eq!(key, "reservation.time_slot")
        }
        other => panic!("expected locator exhaustion, got {:?}", other),
    }
    assert_eq!(run.state, PipelineState::SelectingTime);
    assert_eq!(run.history.last(), Some(&PipelineState::SelectingTime));

    // hours tried in ascending order, every strategy of each
    let position = |css: &str| {
        page.dom_log
            .iter()
            .position(|(l, _)| *l == Locator::css(css))
            .unwrap()
    };
    // a missing timetable only warns; slot lookup still runs
    assert!(position("ul.timetable_list") < position("#erntTime_09"));
    assert!(position("#erntTime_09") < position("#erntTime_10"));
    assert_eq!(page.calls_to(&Locator::label("09:00")).len(), 1);
    assert_eq!(page.calls_to(&Locator::label("10:00")).len(), 1);
    // never advanced
    assert!(page.calls_to(&Locator::css(NEXT)).is_empty());
}

#[tokio::test]
async fn test_partial_selection_still_advances() {
    let mut page = MockPage::site();
    page.remove(&Locator::css("#erntTime_09"));

    let run = run(&mut page).await;

    let output = run.result.unwrap();
    assert_eq!(output.selection.tried_hours, vec![9, 10]);
    assert_eq!(output.selection.picked_hours, vec![10]);
    assert!(output.selection.is_partial());
    assert_eq!(run.state, PipelineState::Submitted);
}

#[tokio::test]
async fn test_slot_found_through_value_fallback() {
    let mut page = MockPage::site();
    page.remove(&Locator::css("#erntTime_09"));
    page.add(Locator::css(r#"input[name="erntYmdh"][value="2025120109"]"#));

    let output = run(&mut page).await.result.unwrap();
    assert_eq!(output.selection.picked_hours, vec![9, 10]);
}

#[tokio::test]
async fn test_dialog_during_slot_selection_is_drained() {
    let mut page = MockPage::site();
    page.raise_after(Locator::css("#erntTime_09"), "선택 가능한 시간이 아닙니다");

    let run = run(&mut page).await;

    let output = run.result.unwrap();
    assert_eq!(output.selection.picked_hours, vec![9]);
    assert!(page.accepted.contains(&"선택 가능한 시간이 아닙니다".to_string()));
}

#[tokio::test]
async fn test_missing_login_field_fails_login() {
    let mut page = MockPage::site();
    page.remove(&Locator::css("#userId"));

    let run = run(&mut page).await;

    assert!(matches!(run.result, Err(StepError::Timeout(_))));
    assert_eq!(run.state, PipelineState::LoggingIn);
    assert_eq!(page.navigations.len(), 1);
}

#[tokio::test]
async fn test_missing_day_cell_fails_select_day() {
    let mut page = MockPage::site();
    page.remove(&Locator::css("#day1"));

    let run = run(&mut page).await;

    assert!(matches!(
        run.result,
        Err(StepError::LocatorExhausted { .. })
    ));
    assert_eq!(run.state, PipelineState::SelectingDay);
}

#[tokio::test]
async fn test_unclickable_advance_control_is_fatal() {
    let mut page = MockPage::site();
    page.add(Locator::css(NEXT)).disabled = true;

    let run = run(&mut page).await;

    assert!(matches!(
        run.result,
        Err(StepError::LocatorExhausted { .. })
    ));
    assert_eq!(run.state, PipelineState::AdvancingStage);
}

#[tokio::test]
async fn test_missing_form_field_is_tolerated() {
    let mut page = MockPage::site();
    page.remove(&Locator::css("#usePurps"));

    let run = run(&mut page).await;

    assert!(run.result.is_ok());
    assert_eq!(page.element("#expectNmpr").unwrap().value, "2");
}

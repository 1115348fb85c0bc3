mod common;

use std::collections::HashSet;
use std::time::Duration;

use common::{paris, quiz, Browser, FakeTriviaApi};
use tokio::time::{sleep, Instant};
use trivia_quiz::models::{Question, Submission};
use trivia_quiz::workflow::{AnswerMark, Phase};

#[tokio::test(start_paused = true)]
async fn test_single_question_correct_answer() {
    let browser = Browser::new();
    let api = FakeTriviaApi::new();
    api.push_questions(vec![paris()]);
    let tab = browser.open_tab(api.clone());

    tab.start(quiz(1, 0)).await.unwrap();
    let view = tab.wait_for_phase(Phase::InProgress).await.unwrap();
    let question = view.question.unwrap();
    assert_eq!(question.number, 1);
    assert_eq!(question.total, 1);
    assert!(question.timer.is_none());

    tab.submit_answer("Paris").unwrap();
    let view = tab
        .wait_for(|v| v.question.as_ref().is_some_and(|q| q.selected_answer.is_some()))
        .await
        .unwrap();
    let submitted = Instant::now();
    assert_eq!(view.score, 1);
    let question = view.question.unwrap();
    assert_eq!(question.is_correct, Some(true));
    assert!(question
        .answers
        .iter()
        .any(|a| a.text == "Paris" && a.mark == AnswerMark::Correct));

    // 揭晓期间仍停留在当前题
    sleep(Duration::from_millis(3_900)).await;
    assert_eq!(tab.view().phase, Phase::InProgress);

    let view = tab.wait_for_phase(Phase::Finished).await.unwrap();
    assert_eq!(submitted.elapsed(), Duration::from_millis(4_000));
    assert_eq!(view.score, 1);
    assert_eq!(view.total, 1);
    assert_eq!(view.summary.as_deref(), Some("You scored 1 out of 1!"));
}

#[tokio::test(start_paused = true)]
async fn test_timeout_auto_advances_with_fresh_timer() {
    let browser = Browser::new();
    let api = FakeTriviaApi::new();
    api.push_questions(vec![paris(), Question::new("2 + 2?", "4", ["3", "5", "22"])]);
    let tab = browser.open_tab(api);

    tab.start(quiz(2, 5)).await.unwrap();
    let view = tab.wait_for_phase(Phase::InProgress).await.unwrap();
    let started = Instant::now();
    assert_eq!(view.question.unwrap().timer.unwrap().remaining, 5);

    let view = tab
        .wait_for(|v| v.question.as_ref().is_some_and(|q| q.selected_answer.is_some()))
        .await
        .unwrap();
    assert_eq!(started.elapsed(), Duration::from_secs(5));
    let question = view.question.unwrap();
    assert_eq!(question.selected_answer, Some(Submission::Timeout));
    assert_eq!(question.is_correct, Some(false));
    assert!(!question.answers_enabled);
    assert_eq!(view.score, 0);

    let view = tab
        .wait_for(|v| v.question.as_ref().is_some_and(|q| q.number == 2))
        .await
        .unwrap();
    assert_eq!(started.elapsed(), Duration::from_secs(9));
    let question = view.question.unwrap();
    assert_eq!(question.timer.unwrap().remaining, 5);
    assert!(question.selected_answer.is_none());
    assert!(question.answers_enabled);
    assert_eq!(view.score, 0);

    // 第二题重新计时
    tab.wait_for(|v| {
        v.question
            .as_ref()
            .and_then(|q| q.timer.as_ref())
            .is_some_and(|t| t.remaining == 4)
    })
    .await
    .unwrap();
    assert_eq!(started.elapsed(), Duration::from_secs(10));
}

#[tokio::test(start_paused = true)]
async fn test_timeout_submits_exactly_once() {
    let browser = Browser::new();
    let api = FakeTriviaApi::new();
    api.push_questions(vec![paris()]);
    let tab = browser.open_tab(api);

    tab.start(quiz(1, 5)).await.unwrap();
    tab.wait_for_phase(Phase::InProgress).await.unwrap();

    let mut views = tab.subscribe();
    let mut timeouts = 0;
    loop {
        views.changed().await.unwrap();
        let view = views.borrow_and_update().clone();
        if view.phase == Phase::Finished {
            assert_eq!(view.score, 0);
            break;
        }
        let selected = view.question.and_then(|q| q.selected_answer);
        if selected == Some(Submission::Timeout) {
            timeouts += 1;
        }
    }

    // 只有揭晓开始那一次视图带着超时答案（揭晓期间视图不再变化）
    assert_eq!(timeouts, 1);
}

#[tokio::test(start_paused = true)]
async fn test_no_results_then_restart() {
    let browser = Browser::new();
    let api = FakeTriviaApi::new();
    api.push_response_code(1);
    let tab = browser.open_tab(api);

    tab.start(quiz(50, 0)).await.unwrap();
    let view = tab.wait_for_phase(Phase::Error).await.unwrap();
    assert_eq!(
        view.error_message.as_deref(),
        Some("No questions found with the selected settings.")
    );

    tab.restart().unwrap();
    let view = tab.wait_for_phase(Phase::Configuring).await.unwrap();
    assert_eq!(view.total, 0);
    assert!(view.question.is_none());
    assert!(view.error_message.is_none());
    // 重新开始后恢复上次成功开始的配置
    assert_eq!(view.configuration, quiz(50, 0));
}

#[tokio::test(start_paused = true)]
async fn test_network_failure_shows_retry_message() {
    let browser = Browser::new();
    let api = FakeTriviaApi::new();
    api.push_network_failure();
    let tab = browser.open_tab(api);

    tab.start(quiz(10, 0)).await.unwrap();
    let view = tab.wait_for_phase(Phase::Error).await.unwrap();
    assert_eq!(
        view.error_message.as_deref(),
        Some("Failed to fetch questions. Please try again later.")
    );
}

#[tokio::test(start_paused = true)]
async fn test_tabs_share_fetch_interval() {
    let browser = Browser::new();
    let api = FakeTriviaApi::new();
    api.push_questions(vec![paris()]);
    api.push_questions(vec![paris()]);
    let tab_a = browser.open_tab(api.clone());
    let tab_b = browser.open_tab(api.clone());

    tab_a.start(quiz(1, 0)).await.unwrap();
    tab_a.wait_for_phase(Phase::InProgress).await.unwrap();

    sleep(Duration::from_secs(1)).await;
    tab_b.start(quiz(1, 0)).await.unwrap();
    let view = tab_b.wait_for_phase(Phase::AwaitingRateLimit).await.unwrap();
    assert_eq!(view.wait_secs, 4);

    tab_b.wait_for_phase(Phase::InProgress).await.unwrap();

    let calls = api.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[1] - calls[0] >= Duration::from_millis(5_000));
}

#[tokio::test(start_paused = true)]
async fn test_same_tab_restart_respects_interval() {
    let browser = Browser::new();
    let api = FakeTriviaApi::new();
    api.push_response_code(2);
    api.push_questions(vec![paris()]);
    let tab = browser.open_tab(api.clone());

    tab.start(quiz(5, 0)).await.unwrap();
    tab.wait_for_phase(Phase::Error).await.unwrap();
    tab.restart().unwrap();
    tab.wait_for_phase(Phase::Configuring).await.unwrap();

    tab.start(quiz(5, 0)).await.unwrap();
    tab.wait_for_phase(Phase::InProgress).await.unwrap();

    let calls = api.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1] - calls[0], Duration::from_millis(5_000));
}

#[tokio::test(start_paused = true)]
async fn test_restart_while_waiting_discards_fetch() {
    let browser = Browser::new();
    let api = FakeTriviaApi::new();
    api.push_questions(vec![paris()]);
    api.push_questions(vec![paris()]);
    let tab_a = browser.open_tab(api.clone());
    let tab_b = browser.open_tab(api.clone());

    tab_a.start(quiz(1, 0)).await.unwrap();
    tab_a.wait_for_phase(Phase::InProgress).await.unwrap();

    tab_b.start(quiz(1, 0)).await.unwrap();
    tab_b.wait_for_phase(Phase::AwaitingRateLimit).await.unwrap();
    tab_b.restart().unwrap();
    tab_b.wait_for_phase(Phase::Configuring).await.unwrap();

    sleep(Duration::from_secs(10)).await;
    let view = tab_b.view();
    assert_eq!(view.phase, Phase::Configuring);
    assert_eq!(view.wait_secs, 0);
    assert_eq!(api.calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_answers_are_permutation_of_each_question() {
    let browser = Browser::new();
    let api = FakeTriviaApi::new();
    let questions: Vec<Question> = (0..5)
        .map(|i| {
            Question::new(
                format!("Q{}", i),
                format!("right {}", i),
                [format!("wrong {}a", i), format!("wrong {}b", i), format!("wrong {}c", i)],
            )
        })
        .collect();
    api.push_questions(questions.clone());
    let tab = browser.open_tab(api);

    tab.start(quiz(5, 0)).await.unwrap();
    tab.wait_for_phase(Phase::InProgress).await.unwrap();

    for (i, source) in questions.iter().enumerate() {
        let view = tab
            .wait_for(|v| {
                v.question
                    .as_ref()
                    .is_some_and(|q| q.number == i + 1 && q.selected_answer.is_none())
            })
            .await
            .unwrap();
        let question = view.question.unwrap();

        let shown: HashSet<_> = question.answers.iter().map(|a| a.text.clone()).collect();
        let expected: HashSet<_> = source.all_answers().into_iter().collect();
        assert_eq!(question.answers.len(), 4);
        assert_eq!(shown, expected);

        tab.submit_answer(source.correct_answer.clone()).unwrap();
        // 重复提交被忽略
        tab.submit_answer(source.correct_answer.clone()).unwrap();
    }

    let view = tab.wait_for_phase(Phase::Finished).await.unwrap();
    assert_eq!(view.score, 5);
    assert_eq!(view.summary.as_deref(), Some("You scored 5 out of 5!"));
}

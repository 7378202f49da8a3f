use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use quiz_core::model::{ChatId, EvaluationOutcome, Prompt};
use services::{
    Dispatcher, Evaluator, EvaluatorError, InboundEvent, MessageSink, QuizController, Shuffler,
    StaticEvaluator, TransportError,
};
use storage::SessionRegistry;
use tokio::sync::mpsc;

#[derive(Default)]
struct RecordingSink {
    sent: Mutex<Vec<(ChatId, String)>>,
    reject: Option<ChatId>,
}

impl RecordingSink {
    fn for_chat(&self, chat_id: ChatId) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(chat, _)| *chat == chat_id)
            .map(|(_, text)| text.clone())
            .collect()
    }
}

#[async_trait]
impl MessageSink for RecordingSink {
    async fn send(&self, chat_id: ChatId, text: &str) -> Result<(), TransportError> {
        if self.reject == Some(chat_id) {
            return Err(TransportError::Delivery {
                chat_id: chat_id.value(),
                reason: "blocked by user".into(),
            });
        }
        self.sent.lock().unwrap().push((chat_id, text.to_owned()));
        Ok(())
    }
}

/// Accepts every answer and remembers the order it was graded in, per prompt
/// owner.
struct GradeLog {
    corpus: usize,
    graded: Mutex<Vec<(String, String)>>,
}

impl GradeLog {
    fn new(corpus: usize) -> Self {
        Self {
            corpus,
            graded: Mutex::new(Vec::new()),
        }
    }

    fn answers(&self, owner: &str) -> Vec<String> {
        self.graded
            .lock()
            .unwrap()
            .iter()
            .filter(|(tag, _)| tag == owner)
            .map(|(_, answer)| answer.clone())
            .collect()
    }
}

#[async_trait]
impl Evaluator for GradeLog {
    async fn list_prompts(&self) -> Result<Vec<Prompt>, EvaluatorError> {
        Ok((0..self.corpus)
            .map(|n| Prompt::parse(format!("verb {n}")).unwrap())
            .collect())
    }

    async fn check_answer(
        &self,
        _prompt: &Prompt,
        answer: &str,
    ) -> Result<EvaluationOutcome, EvaluatorError> {
        tokio::task::yield_now().await;
        let (owner, _) = answer.split_once(':').unwrap_or(("", answer));
        self.graded
            .lock()
            .unwrap()
            .push((owner.to_owned(), answer.to_owned()));
        Ok(EvaluationOutcome::Correct)
    }
}

fn inversions(answers: &[String]) -> usize {
    let order: Vec<usize> = answers
        .iter()
        .map(|answer| answer.rsplit(':').next().unwrap().parse().unwrap())
        .collect();
    order.windows(2).filter(|pair| pair[0] > pair[1]).count()
}

fn dispatcher(sink: Arc<RecordingSink>) -> Dispatcher {
    let evaluator = Arc::new(StaticEvaluator::new([("go", "went gone")]));
    let controller = QuizController::new(Arc::new(SessionRegistry::new()), evaluator)
        .with_shuffler(Shuffler::seeded(3));
    Dispatcher::new(Arc::new(controller), sink)
}

#[tokio::test]
async fn replies_reach_the_sink_in_order() {
    let sink = Arc::new(RecordingSink::default());
    let dispatcher = dispatcher(sink.clone());
    let chat = ChatId::new(1);

    let delivered = dispatcher
        .dispatch(InboundEvent::text(chat, "/start").with_sender("bob"))
        .await;
    assert_eq!(delivered, 2);

    dispatcher.dispatch(InboundEvent::text(chat, "went gone")).await;

    let sent = sink.for_chat(chat);
    assert!(sent[0].starts_with("Hello bob! Let's start!"));
    assert_eq!(&sent[1..], ["\"go\"", "Correct!", "Done!"]);
}

#[tokio::test]
async fn filtered_events_never_reach_controller() {
    let sink = Arc::new(RecordingSink::default());
    let dispatcher = dispatcher(sink.clone());
    let chat = ChatId::new(2);

    dispatcher.dispatch(InboundEvent::text(chat, "/start")).await;
    assert_eq!(dispatcher.dispatch(InboundEvent::other(chat)).await, 0);
    assert_eq!(dispatcher.dispatch(InboundEvent::text(chat, "   ")).await, 0);

    assert_eq!(sink.for_chat(chat).len(), 2);
    assert!(dispatcher.controller().registry().contains(chat));
}

#[tokio::test]
async fn delivery_failure_does_not_stop_the_quiz() {
    let chat = ChatId::new(3);
    let sink = Arc::new(RecordingSink {
        reject: Some(chat),
        ..RecordingSink::default()
    });
    let dispatcher = dispatcher(sink.clone());

    assert_eq!(dispatcher.dispatch(InboundEvent::text(chat, "/start")).await, 0);
    assert!(dispatcher.controller().registry().contains(chat));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn run_drains_channel_across_chats() {
    let sink = Arc::new(RecordingSink::default());
    let dispatcher = Arc::new(dispatcher(sink.clone()));
    let (tx, rx) = mpsc::channel(64);

    let runner = tokio::spawn(Arc::clone(&dispatcher).run(rx));
    for chat in 100..110 {
        tx.send(InboundEvent::text(ChatId::new(chat), "/start"))
            .await
            .unwrap();
    }
    drop(tx);
    runner.await.unwrap();

    for chat in 100..110 {
        assert_eq!(sink.for_chat(ChatId::new(chat)).len(), 2, "chat {chat}");
    }
    assert_eq!(dispatcher.controller().registry().len(), 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn run_grades_one_chats_answers_in_arrival_order() {
    const ANSWERS: usize = 400;
    let sink = Arc::new(RecordingSink::default());
    let evaluator = Arc::new(GradeLog::new(ANSWERS + 1));
    let controller = QuizController::new(Arc::new(SessionRegistry::new()), evaluator.clone());
    let dispatcher = Arc::new(Dispatcher::new(Arc::new(controller), sink.clone()));
    let (tx, rx) = mpsc::channel(16);
    let runner = tokio::spawn(Arc::clone(&dispatcher).run(rx));

    let solo = ChatId::new(7);
    let noisy = [ChatId::new(8), ChatId::new(9)];
    tx.send(InboundEvent::text(solo, "/start")).await.unwrap();
    for chat in noisy {
        tx.send(InboundEvent::text(chat, "/start")).await.unwrap();
    }
    for n in 0..ANSWERS {
        tx.send(InboundEvent::text(solo, format!("solo:{n}")))
            .await
            .unwrap();
        // Other chats keep the runtime busy so per-event scheduling would reorder.
        if n % 3 == 0 {
            let chat = noisy[n % 2];
            tx.send(InboundEvent::text(chat, format!("noise{}:{n}", chat.value())))
                .await
                .unwrap();
        }
        if n % 100 == 99 {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
    }
    drop(tx);
    runner.await.unwrap();

    let graded = evaluator.answers("solo");
    assert_eq!(graded.len(), ANSWERS, "every answer was graded");
    assert_eq!(inversions(&graded), 0, "answers graded out of arrival order");
    for chat in noisy {
        let owner = format!("noise{}", chat.value());
        assert_eq!(inversions(&evaluator.answers(&owner)), 0, "{owner}");
    }

    let replies = sink.for_chat(solo);
    assert_eq!(replies.len(), 2 + 2 * ANSWERS);
    assert_eq!(replies.iter().filter(|text| *text == "Correct!").count(), ANSWERS);
    assert!(dispatcher.controller().registry().contains(solo));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn run_keeps_order_across_idle_gaps() {
    let sink = Arc::new(RecordingSink::default());
    let evaluator = Arc::new(GradeLog::new(300));
    let controller = QuizController::new(Arc::new(SessionRegistry::new()), evaluator.clone());
    let dispatcher = Arc::new(Dispatcher::new(Arc::new(controller), sink.clone()));
    let (tx, rx) = mpsc::channel(4);
    let runner = tokio::spawn(Arc::clone(&dispatcher).run(rx));

    let chat = ChatId::new(21);
    tx.send(InboundEvent::text(chat, "/start")).await.unwrap();
    for n in 0..200 {
        tx.send(InboundEvent::text(chat, format!("gap:{n}")))
            .await
            .unwrap();
        // Let the chat's queue empty now and then so idle workers get retired.
        if n % 50 == 49 {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
    }
    drop(tx);
    runner.await.unwrap();

    let graded = evaluator.answers("gap");
    assert_eq!(graded.len(), 200);
    assert_eq!(inversions(&graded), 0);
}

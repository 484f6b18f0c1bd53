use std::sync::Arc;

use crate::llm::classifier::classify;
use crate::llm::compose::compose;
use crate::llm::error::ProviderError;
use crate::llm::prompts::REJECTION_MESSAGE;
use crate::llm::provider::CompletionProvider;
use crate::models::ChatResponse;
use crate::search::ranking::SearchService;

/// Canned answers keyed by the exact (trimmed) question.
const PREDEFINED_ANSWERS: [(&str, &str); 4] = [
    (
        "달레 스터디 참여 방법",
        "달레 스터디에 참여하시려면:\n\n1. 웹사이트에서 관심 있는 스터디를 선택하세요\n2. 신청서를 작성하여 제출하세요\n3. 신청서 검토 후 개별 연락을 드립니다\n4. 스터디 시작 전 오리엔테이션에 참석하세요\n\n자세한 내용은 각 스터디 페이지에서 확인하실 수 있습니다.",
    ),
    (
        "현재 진행 중인 프로젝트",
        "현재 진행 중인 스터디 프로젝트들:\n\n• 인공지능 스터디\n• 리트코드 스터디\n• 영어 면접 스터디\n• 달레 디자인 시스템\n\n각 프로젝트의 자세한 정보는 프로젝트 페이지에서 확인하실 수 있습니다.",
    ),
    (
        "참가비가 있나요?",
        "대부분의 스터디는 무료로 진행됩니다.\n\n일부 프로젝트의 경우 서버비 등 최소한의 비용만 분담하며, 구체적인 비용은 각 스터디 페이지에서 확인하실 수 있습니다.\n\n비용이 발생하는 경우 사전에 안내드리며, 참가자들이 합의한 금액입니다.",
    ),
    (
        "초보자도 참여 가능한가요?",
        "네! 초보자도 충분히 참여 가능합니다.\n\n다양한 난이도의 스터디가 준비되어 있어요:\n• 입문자용: 기초부터 차근차근 학습\n• 중급자용: 실무 프로젝트 경험\n• 고급자용: 심화 기술 학습\n\n각 스터디 설명에서 필요한 사전 지식을 확인하시고, 본인 수준에 맞는 스터디를 선택하세요.",
    ),
];

pub fn predefined_answer(message: &str) -> Option<ChatResponse> {
    let key = message.trim();
    PREDEFINED_ANSWERS
        .iter()
        .find(|(question, _)| *question == key)
        .map(|(_, answer)| ChatResponse {
            message: answer.to_string(),
            sources: Vec::new(),
        })
}

pub fn rejection() -> ChatResponse {
    ChatResponse {
        message: REJECTION_MESSAGE.to_string(),
        sources: Vec::new(),
    }
}

/// Question answering: canned shortcut, relevance gate, search, answer.
pub struct ChatPipeline {
    provider: Arc<dyn CompletionProvider>,
    search: Arc<SearchService>,
}

impl ChatPipeline {
    pub fn new(provider: Arc<dyn CompletionProvider>, search: Arc<SearchService>) -> Self {
        Self { provider, search }
    }

    /// At most two provider calls, in order: classify, then compose.
    pub async fn answer(&self, message: &str) -> Result<ChatResponse, ProviderError> {
        if let Some(canned) = predefined_answer(message) {
            tracing::info!("Answered from predefined responses");
            return Ok(canned);
        }

        if !classify(self.provider.as_ref(), message).await? {
            tracing::info!("Question rejected by relevance gate");
            return Ok(rejection());
        }

        let results = self.search.search_all(message);
        tracing::info!("Search returned {} results", results.len());

        compose(self.provider.as_ref(), message, &results).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::prompts::NO_RESULTS_MARKER;
    use crate::llm::provider::{Completion, CompletionOptions};
    use crate::models::{ChatMessage, Faq, Project, ProjectStatus, RecordKind};
    use crate::store::RecordStore;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned replies in order and records every request.
    struct ScriptedProvider {
        replies: Mutex<VecDeque<Result<String, ProviderError>>>,
        calls: Mutex<Vec<(Vec<ChatMessage>, CompletionOptions)>>,
    }

    impl ScriptedProvider {
        fn new(replies: Vec<Result<String, ProviderError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<(Vec<ChatMessage>, CompletionOptions)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CompletionProvider for ScriptedProvider {
        async fn complete(
            &self,
            messages: Vec<ChatMessage>,
            options: CompletionOptions,
        ) -> Result<Completion, ProviderError> {
            self.calls.lock().unwrap().push((messages, options));
            let reply = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected provider call");
            reply.map(|content| Completion {
                content,
                usage: None,
            })
        }
    }

    fn service() -> Arc<SearchService> {
        let store = RecordStore {
            projects: vec![Arc::new(Project {
                id: "leetcode".into(),
                title: "리트코드 스터디".into(),
                description: "매주 알고리즘 문제를 함께 풉니다".into(),
                status: ProjectStatus::Active,
                participant_count: 20,
                duration: "상시".into(),
                tech_stack: vec!["Python".into(), "JavaScript".into()],
                schedule: "매주 일요일".into(),
                keywords: vec!["알고리즘".into(), "코딩테스트".into()],
                tags: vec!["study".into()],
            })],
            faqs: vec![Arc::new(Faq {
                id: "join".into(),
                question: "스터디에 어떻게 참여하나요?".into(),
                answer: "각 스터디 페이지에서 신청서를 작성하세요.".into(),
                keywords: vec!["알고리즘 스터디".into()],
                tags: vec!["participation".into()],
            })],
        };
        Arc::new(SearchService::new(&store))
    }

    fn pipeline(provider: Arc<ScriptedProvider>) -> ChatPipeline {
        ChatPipeline::new(provider, service())
    }

    #[tokio::test]
    async fn test_rejection_skips_search_and_compose() {
        let provider = ScriptedProvider::new(vec![Ok("NO.".into())]);
        let response = pipeline(provider.clone())
            .answer("오늘 점심 뭐 먹지?")
            .await
            .unwrap();
        assert_eq!(response, rejection());
        assert!(response.sources.is_empty());
        assert_eq!(provider.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_predefined_question_bypasses_provider() {
        let provider = ScriptedProvider::new(vec![]);
        let response = pipeline(provider.clone())
            .answer("  참가비가 있나요?  ")
            .await
            .unwrap();
        assert!(response.message.starts_with("대부분의 스터디는 무료로"));
        assert!(response.sources.is_empty());
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn test_relevant_question_is_answered_with_sources() {
        let provider = ScriptedProvider::new(vec![Ok("YES".into()), Ok("답변입니다".into())]);
        let response = pipeline(provider.clone())
            .answer("알고리즘")
            .await
            .unwrap();

        assert_eq!(response.message, "답변입니다");
        assert!(!response.sources.is_empty());
        assert!(response.sources.len() <= 3);
        assert_eq!(response.sources[0].kind, RecordKind::Project);
        assert_eq!(response.sources[0].id, "리트코드-스터디");

        let calls = provider.calls();
        assert_eq!(calls.len(), 2);
        let (classify_msgs, classify_opts) = &calls[0];
        assert_eq!(classify_msgs.len(), 1);
        assert_eq!(classify_opts.max_tokens, 10);
        let (answer_msgs, answer_opts) = &calls[1];
        assert_eq!(answer_msgs[0].role, "system");
        assert!(answer_msgs[1].content.contains("[검색결과 1] (프로젝트)"));
        assert_eq!(answer_opts.max_tokens, 1000);
    }

    #[tokio::test]
    async fn test_no_results_uses_not_found_prompt() {
        let provider = ScriptedProvider::new(vec![Ok("yes".into()), Ok("일반 안내".into())]);
        let response = pipeline(provider.clone())
            .answer("zzqqxx")
            .await
            .unwrap();
        assert!(response.sources.is_empty());
        let calls = provider.calls();
        assert!(calls[1].0[1].content.contains(NO_RESULTS_MARKER));
    }

    #[tokio::test]
    async fn test_classifier_failure_propagates() {
        let provider = ScriptedProvider::new(vec![Err(ProviderError::timeout())]);
        let err = pipeline(provider.clone())
            .answer("스터디 일정 알려주세요")
            .await
            .unwrap_err();
        assert_eq!(err.status, 408);
        assert_eq!(provider.calls().len(), 1);
    }

    #[test]
    fn test_predefined_answer_requires_exact_text() {
        assert!(predefined_answer("달레 스터디 참여 방법").is_some());
        assert!(predefined_answer("달레 스터디 참여 방법?").is_none());
    }
}

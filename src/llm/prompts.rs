//! Fixed prompt texts and prompt builders.

use crate::models::RecordKind;

/// Persona for answer generation.
pub const SYSTEM_MESSAGE: &str = "당신은 달레 스터디 커뮤니티의 AI 도우미입니다.

역할:
- 달레 스터디 커뮤니티의 프로그래밍 스터디, 프로젝트, FAQ 관련 정보를 제공
- 친근하고 도움되는 톤으로 대화
- 정확하고 구체적인 정보 제공을 우선시

대답 원칙:
1. 제공된 검색 결과를 바탕으로만 답변
2. 정보가 부족하면 솔직히 모른다고 말하기
3. 관련 없는 질문에는 정중히 거절
4. 한국어로 자연스럽게 답변
5. 답변 마지막에 추가 질문이 있으면 언제든 물어보라고 안내";

/// Returned verbatim when the relevance gate rejects a question.
pub const REJECTION_MESSAGE: &str = "안녕하세요! 저는 달레 스터디 커뮤니티 전용 AI 도우미입니다. 🤖

현재 질문은 달레 스터디 커뮤니티와 직접적인 관련이 없는 것 같아요.

제가 도움을 드릴 수 있는 주제들:
• 달레 스터디 프로그래밍 스터디 정보
• 오픈소스 프로젝트 참여 방법
• 스터디 신청 및 참여 절차
• 커뮤니티 활동 관련 안내
• 프로젝트 진행 상황 및 일정

달레 스터디와 관련된 궁금한 점이 있으시면 언제든 말씀해주세요! 😊";

/// Marker placed in the answer prompt when nothing was retrieved.
pub const NO_RESULTS_MARKER: &str = "검색 결과: 관련된 정보를 찾을 수 없습니다.";

/// Grounding entry rendered into the answer prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextItem {
    pub title: String,
    pub content: String,
    pub kind: RecordKind,
    pub score: f64,
}

pub fn classifier_prompt(question: &str) -> String {
    format!(
        "다음 질문이 달레 스터디 커뮤니티와 관련된 질문인지 판단해주세요.

달레 스터디 관련 주제:
- 프로그래밍 스터디 (JavaScript, Python, React, Node.js 등)
- 오픈소스 프로젝트 참여
- 개발 학습 및 스터디 그룹
- 커뮤니티 활동 및 참여 방법
- 프로젝트 진행 상황 및 일정
- 스터디 신청 및 참여 절차
- 개발 관련 협업 및 코드 리뷰
- 기술 학습 자료 및 추천

관련 없는 주제:
- 일반적인 프로그래밍 기술 질문 (튜토리얼, 디버깅 등)
- 개인적인 고민이나 상담
- 타 커뮤니티나 회사 관련 질문
- 정치, 종교, 개인정보 등 민감한 주제
- 달레 스터디와 무관한 일반 상식

사용자 질문: \"{question}\"

위 질문이 달레 스터디 커뮤니티와 관련이 있나요?
답변: YES 또는 NO만 답하세요."
    )
}

/// Relevance shown to the model, `round((1 - score) * 100)`.
pub fn relevance_percent(score: f64) -> i64 {
    ((1.0 - score) * 100.0).round() as i64
}

fn kind_label(kind: RecordKind) -> &'static str {
    match kind {
        RecordKind::Project => "프로젝트",
        RecordKind::Faq => "FAQ",
    }
}

pub fn answer_prompt(question: &str, items: &[ContextItem]) -> String {
    if items.is_empty() {
        return format!(
            "사용자 질문: \"{question}\"

{NO_RESULTS_MARKER}

위 질문에 대해 검색 결과가 없다는 점을 고려하여 답변해주세요.
달레 스터디 커뮤니티에 대한 일반적인 안내나 다른 방법으로 도움을 줄 수 있는지 제안해주세요.
답변 마지막에는 \"더 구체적인 질문이나 다른 궁금한 점이 있으시면 언제든 말씀해주세요!\"라고 안내해주세요."
        );
    }

    let mut results = String::new();
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            results.push('\n');
        }
        results.push_str(&format!(
            "\n[검색결과 {}] ({})\n제목: {}\n내용: {}\n관련도: {}%\n",
            i + 1,
            kind_label(item.kind),
            item.title,
            item.content,
            relevance_percent(item.score)
        ));
    }

    format!(
        "사용자 질문: \"{question}\"

검색 결과:
{results}

위 검색 결과를 바탕으로 사용자의 질문에 대해 도움되고 정확한 답변을 해주세요.

답변 가이드라인:
1. 검색 결과의 정보를 활용하여 구체적으로 답변
2. 여러 검색 결과가 있다면 가장 관련성 높은 정보부터 언급
3. 프로젝트 정보의 경우 참여 방법, 기술 스택, 일정 등을 포함
4. FAQ의 경우 명확하고 실용적인 답변 제공
5. 추가 질문을 유도할 수 있는 친근한 마무리
6. 답변 마지막에는 \"더 궁금한 점이 있으시면 언제든 말씀해주세요!\"라고 안내"
    )
}

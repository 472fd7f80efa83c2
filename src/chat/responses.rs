//! Canned demo replies: a static keyword table, not logic.

use rand::seq::SliceRandom;
use rand::Rng;

/// Replies to messages containing any of `keywords` (lowercase).
pub struct ResponseRule {
    pub keywords: &'static [&'static str],
    pub reply: &'static str,
}

/// Checked in order; the first rule with a matching keyword wins.
pub static RESPONSE_RULES: &[ResponseRule] = &[
    ResponseRule {
        keywords: &["hello", "hi", "hey", "greetings"],
        reply: "Hello! Great to meet you! I'm BitBot, powered by LangChain and LangGraph. \
                How can I help you today?",
    },
    ResponseRule {
        keywords: &["help", "what can you do", "capabilities", "features"],
        reply: "I'm BitBot, your AI assistant! I can help with various tasks including:\n\n\
                • Answering questions and providing information\n\
                • Data analysis and insights\n\
                • Integration with MLPlayground for machine learning experiments\n\
                • Credit risk modeling and analysis\n\
                • General problem-solving and consultation\n\n\
                What would you like assistance with?",
    },
    ResponseRule {
        keywords: &["bitbot", "about", "who are you", "what are you"],
        reply: "I'm BitBot, an AI assistant built with LangChain and LangGraph! I'm designed to \
                integrate with MLPlayground and Credit Risk modeling systems. My backend runs on \
                Azure with FastAPI, and I'm here to help you with intelligent conversations, data \
                analysis, and ML workflows.",
    },
    ResponseRule {
        keywords: &["langchain", "langgraph", "technology", "tech stack"],
        reply: "I'm built using cutting-edge AI technologies:\n\n\
                🔗 **LangChain**: For building applications with LLMs\n\
                📊 **LangGraph**: For creating stateful, multi-actor applications\n\
                ⚡ **FastAPI**: High-performance Python web framework\n\
                ☁️ **Azure**: Cloud hosting and scalability\n\
                🤖 **Advanced AI Models**: For intelligent responses\n\n\
                This stack enables me to provide sophisticated, context-aware assistance!",
    },
    ResponseRule {
        keywords: &["mlplayground", "credit risk", "integration", "ml", "machine learning"],
        reply: "Excellent question! I'm designed to seamlessly integrate with:\n\n\
                🧪 **MLPlayground**: For machine learning experimentation, model training, and data analysis\n\
                📊 **Credit Risk Models**: For financial risk assessment and modeling\n\
                🔄 **Workflow Integration**: Connecting different ML pipelines\n\n\
                Once my backend is fully connected, I'll be able to help you run experiments, \
                analyze model performance, and provide insights from your credit risk assessments. \
                This integration is coming soon!",
    },
    ResponseRule {
        keywords: &["backend", "api", "azure", "fastapi", "development"],
        reply: "My backend architecture includes:\n\n\
                ⚡ **FastAPI**: Modern, fast web framework for APIs\n\
                ☁️ **Azure**: Cloud hosting with scalability and reliability\n\
                🔗 **LangChain**: LLM application framework\n\
                📊 **LangGraph**: Stateful multi-agent workflows\n\
                🔒 **Security**: Enterprise-grade authentication and authorization\n\n\
                The backend integration is currently in development. For now, I'm running in demo \
                mode with intelligent mock responses, but soon I'll have full AI capabilities!",
    },
    ResponseRule {
        keywords: &["thank", "thanks", "appreciate"],
        reply: "You're very welcome! I'm happy to help. Is there anything else you'd like to know \
                or discuss? I'm here to assist with any questions about AI, machine learning, or \
                technical topics!",
    },
];

/// Used when no rule matches; one is picked at random.
pub static DEFAULT_REPLIES: &[&str] = &[
    "That's an interesting point! I'm currently in demo mode while my LangChain/LangGraph backend \
     is being developed. Once fully integrated, I'll be able to provide more sophisticated \
     responses and connect with your ML systems for advanced analysis.",
    "I understand what you're saying. As BitBot, I'm designed to be your intelligent assistant \
     for ML and data science tasks. My full capabilities with LangChain and LangGraph integration \
     are coming soon, including seamless MLPlayground connectivity!",
    "Thanks for sharing that with me! I'm BitBot, and while I'm currently in demo mode, I'm \
     excited to help you once my backend systems are fully operational. The integration with \
     credit risk models will unlock powerful analytical capabilities.",
    "Interesting perspective! I'm processing your message, and while my full AI capabilities are \
     still being developed, I'm designed to excel at data analysis, ML workflows, and intelligent \
     problem-solving. The LangGraph integration will enable complex multi-step reasoning.",
    "I appreciate your input! As an AI assistant powered by LangChain and LangGraph (in \
     development), I'm built to handle complex queries and integrate seamlessly with your existing \
     ML projects. Soon I'll be able to provide real-time insights from your MLPlayground \
     experiments!",
];

/// Reply of the first rule whose keyword appears in `message` as a whole
/// word or phrase, ignoring case.
pub fn match_reply(message: &str) -> Option<&'static str> {
    let lower = message.to_lowercase();
    RESPONSE_RULES
        .iter()
        .find(|rule| rule.keywords.iter().any(|k| contains_phrase(&lower, k)))
        .map(|rule| rule.reply)
}

/// Matching reply, or a random default.
pub fn select_reply<R: Rng + ?Sized>(message: &str, rng: &mut R) -> &'static str {
    match_reply(message)
        .or_else(|| DEFAULT_REPLIES.choose(rng).copied())
        .unwrap_or(DEFAULT_REPLIES[0])
}

/// `phrase` occurs in `haystack` bounded by non-alphanumerics, so "hi" does
/// not match "this".
fn contains_phrase(haystack: &str, phrase: &str) -> bool {
    haystack.match_indices(phrase).any(|(start, _)| {
        let end = start + phrase.len();
        let before_ok = haystack[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric());
        let after_ok = haystack[end..]
            .chars()
            .next()
            .map_or(true, |c| !c.is_alphanumeric());
        before_ok && after_ok
    })
}

//! Built-in prompt templates.
//!
//! One definition per judgment role in the workflow. Binary graders are
//! instructed to answer with a bare "yes" or "no"; the router and the outer
//! answer grader return small JSON objects that the callers parse leniently.

use crate::types::PromptDefinition;

/// Answer generation over retrieved context and rolling chat history.
pub const RAG_GENERATE: PromptDefinition = PromptDefinition {
    id: "rag.generate",
    system: "You are an AI assistant for question-answering tasks. Use the provided \
             context along with the previous chat history to deliver a precise and \
             concise response. If the information is insufficient or unclear, \
             acknowledge that you don't know. Keep the answer brief (three sentences \
             or less) while maintaining clarity and relevance.",
    template: "Question: {{question}}\n\nContext:\n{{context}}\n\nChat history:\n{{chat_history}}\n\nAnswer:",
};

/// Binary relevance judgment of one retrieved document against the question.
pub const RAG_GRADE_DOCUMENT: PromptDefinition = PromptDefinition {
    id: "rag.grade_document",
    system: "You are a grader assessing the relevance of a retrieved document to a \
             user question. If the document contains keywords or semantic content \
             related to the question, grade it as relevant. Answer with a single \
             word: 'yes' or 'no'.",
    template: "Retrieved document:\n{{document}}\n\nUser question: {{question}}\n\nIs the document relevant?",
};

/// Binary groundedness judgment of a generation against its evidence.
pub const RAG_GRADE_GROUNDEDNESS: PromptDefinition = PromptDefinition {
    id: "rag.grade_groundedness",
    system: "You are a grader assessing whether an answer is grounded in a set of \
             retrieved facts. Every substantive claim in the answer must be \
             supported by the facts. Answer with a single word: 'yes' or 'no'.",
    template: "Facts:\n{{documents}}\n\nAnswer:\n{{generation}}\n\nIs the answer grounded in the facts?",
};

/// Binary usefulness judgment of a generation against the question.
pub const RAG_GRADE_USEFULNESS: PromptDefinition = PromptDefinition {
    id: "rag.grade_usefulness",
    system: "You are a grader assessing whether an answer addresses and resolves a \
             question. Answer with a single word: 'yes' or 'no'.",
    template: "Question: {{question}}\n\nAnswer:\n{{generation}}\n\nDoes the answer resolve the question?",
};

/// Retrieval-focused query rewrite (corpus phrasing, not whole-answer context).
pub const RAG_TRANSFORM_QUERY: PromptDefinition = PromptDefinition {
    id: "rag.transform_query",
    system: "You are a question re-writer that converts an input question to a \
             better version optimized for retrieval from a document collection. \
             Look at the input and reason about its underlying semantic intent. \
             Respond with the improved question only, no preamble.",
    template: "Initial question: {{question}}\n\nImproved question:",
};

/// Deeper-reasoning fallback pass over the best retrieved evidence.
pub const RAG_INTROSPECT: PromptDefinition = PromptDefinition {
    id: "rag.introspect",
    system: "You are a careful analytical assistant. The standard answering flow \
             could not produce an answer grounded in the retrieved material. \
             Reason step by step over the evidence below, state clearly what can \
             and cannot be concluded from it, and give your best supported answer.",
    template: "Question: {{question}}\n\nMost relevant retrieved evidence:\n{{evidence}}",
};

/// Classifier mapping a query to zero or more specialist agents.
pub const ROUTER_CLASSIFY: PromptDefinition = PromptDefinition {
    id: "router.classify",
    system: "You are an intelligent agent router for an agricultural AI platform. \
             Analyze the user's query and select the most relevant agents to handle \
             it from the roster below. A query tagged [IMAGE_PROVIDED] carries an \
             image attachment; prefer image-capable agents for it.\n\n\
             AGENT ROSTER:\n{{roster}}\n\n\
             Return a JSON object with two lists: \"agents\" (names chosen from the \
             roster) and \"justifications\" (one step-by-step reason per chosen \
             agent). Return JSON only, no other text.",
    template: "Query: \"{{query}}\"",
};

/// Merge of multiple specialist answers into one.
pub const SYNTHESIZE: PromptDefinition = PromptDefinition {
    id: "synthesize",
    system: "You are a synthesis and summarization expert for agricultural AI. Take \
             the responses below, which may overlap, contradict each other, or \
             contain error notices, and refactor them into a single clear, \
             actionable, well-structured answer. Remove redundancy and resolve \
             contradictions in favor of the more specific and better-evidenced \
             claim. Do not mention the individual responses or any internal \
             implementation details.",
    template: "Responses:\n{{responses}}\n\nProvide the final synthesized answer below:",
};

/// Lenient adequacy judgment of a candidate answer (outer controller).
pub const GRADE_ANSWER: PromptDefinition = PromptDefinition {
    id: "grade_answer",
    system: "You are evaluating whether an answer adequately addresses a question. \
             Be lenient: minor phrasing or formatting issues are acceptable. Mark \
             the answer inadequate only if it is off-topic, substantively wrong, or \
             clearly fails to address the question. Return a JSON object: \
             {\"adequate\": true|false, \"reasoning\": \"one short sentence\"}. \
             Return JSON only.",
    template: "Question: {{question}}\n\nCandidate answer:\n{{answer}}",
};

/// Whole-answer-context query rewrite (outer controller).
pub const REWRITE_QUERY: PromptDefinition = PromptDefinition {
    id: "rewrite_query",
    system: "You are a question re-writer. The previous attempt to answer the \
             question below was unsatisfactory. Rewrite the question so that a \
             fresh attempt is more likely to succeed, making implicit requirements \
             explicit. Respond with the rewritten question only, no preamble.",
    template: "Original question: {{question}}\n\nUnsatisfactory answer:\n{{previous_answer}}\n\nRewritten question:",
};

/// Generic specialist role wrapper; the role text comes from the registry.
pub const SPECIALIST: PromptDefinition = PromptDefinition {
    id: "specialist",
    system: "{{role}}",
    template: "{{query}}",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_ids_unique() {
        let ids = [
            RAG_GENERATE.id,
            RAG_GRADE_DOCUMENT.id,
            RAG_GRADE_GROUNDEDNESS.id,
            RAG_GRADE_USEFULNESS.id,
            RAG_TRANSFORM_QUERY.id,
            RAG_INTROSPECT.id,
            ROUTER_CLASSIFY.id,
            SYNTHESIZE.id,
            GRADE_ANSWER.id,
            REWRITE_QUERY.id,
            SPECIALIST.id,
        ];

        let mut seen = std::collections::HashSet::new();
        for id in ids {
            assert!(seen.insert(id), "duplicate prompt id: {}", id);
        }
    }

    #[test]
    fn test_graders_demand_binary_output() {
        for def in [RAG_GRADE_DOCUMENT, RAG_GRADE_GROUNDEDNESS, RAG_GRADE_USEFULNESS] {
            assert!(def.system.contains("'yes' or 'no'"), "{}", def.id);
        }
    }
}

//! Prompt text for grounded FAQ answers.

use std::fmt::Write;

use super::retriever::ScoredFaq;

/// Returned when nothing relevant was retrieved; no model call is made.
pub const NOT_AVAILABLE_MESSAGE: &str = "I'm sorry, I don't have information about that right now. \
Please contact our customer support team and they will be happy to help.";

pub fn system_instruction(store_name: &str) -> String {
    format!(
        "You are a friendly customer support assistant for {store}. \
Answer the customer's question using only the FAQ entries provided in the context. \
If the context does not contain the answer, say politely that the information is not available \
and suggest contacting {store} customer support. \
Do not invent policies, prices or contact details. Keep the answer short and clear.",
        store = store_name
    )
}

/// Numbered FAQ context followed by the customer's question.
pub fn user_message(question: &str, context: &[ScoredFaq]) -> String {
    let mut message = String::from("Context:\n");
    for (i, faq) in context.iter().enumerate() {
        let _ = writeln!(
            message,
            "[{}] (relevance: {:.2})\nQ: {}\nA: {}\n",
            i + 1,
            faq.score,
            faq.record.question,
            faq.record.answer
        );
    }
    let _ = write!(message, "Customer question: {}", question.trim());
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::faq::FaqRecord;

    #[test]
    fn context_is_numbered_with_scores() {
        let context = vec![
            ScoredFaq {
                record: FaqRecord::new("qa_0", "What payment methods do you accept?", "Visa and PayPal."),
                score: 0.91,
            },
            ScoredFaq {
                record: FaqRecord::new("qa_1", "Do you offer COD?", "No."),
                score: 0.4,
            },
        ];

        let message = user_message("  Can I pay with Paytm? ", &context);

        assert!(message.contains("[1] (relevance: 0.91)\nQ: What payment methods do you accept?\nA: Visa and PayPal."));
        assert!(message.contains("[2] (relevance: 0.40)"));
        assert!(message.ends_with("Customer question: Can I pay with Paytm?"));
    }

    #[test]
    fn system_instruction_names_the_store() {
        let instruction = system_instruction("UK Mega Shop");
        assert!(instruction.contains("UK Mega Shop customer support"));
        assert!(instruction.contains("only the FAQ entries"));
    }
}

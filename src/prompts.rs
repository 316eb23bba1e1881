// Prompt templates. Each builder is a pure function of its inputs.

use crate::knowledge::Intent;

pub fn classify_prompt(inquiry: &str) -> String {
    let categories = Intent::ALL
        .iter()
        .map(|intent| intent.label())
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "\nYou are a bank customer service bot.\n\
         Classify the bank inquiry into ONE category only:\n\
         {}\n\n\
         Return ONLY the category text. No explanations.\n\n\
         Inquiry: {}\n\
         Category:\n",
        categories, inquiry
    )
}

pub fn answer_prompt(guidance: &str, question: &str) -> String {
    format!(
        "\nYou are a helpful bank support assistant.\n\
         Answer using ONLY the guidance below.\n\
         Keep it short and clear.\n\n\
         Guidance:\n\
         {}\n\n\
         Customer question:\n\
         {}\n\n\
         Answer:\n",
        guidance, question
    )
}

pub fn extraction_prompt(notes: &str) -> String {
    format!(
        "Extract age, gender, diagnosis, weight, smoking as JSON from:\n{}",
        notes
    )
}

pub fn email_prompt(facts: &str, email: &str) -> String {
    format!(
        "\nYou are a mortgage lender support bot.\n\
         Reply politely using only the facts below.\n\
         Sign as Lender Customer Support.\n\n\
         Facts:\n\
         {}\n\n\
         Email:\n\
         {}\n",
        facts, email
    )
}

pub fn summary_prompt(text: &str) -> String {
    format!("Summarize in 5-8 bullet points:\n\n{}", text)
}

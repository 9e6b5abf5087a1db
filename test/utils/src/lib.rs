/// Conversation record as returned by `/conversation_history`. Assistant turns
/// are stored server side with the `system` role.
pub fn conversation_history_fixture() -> &'static str {
    return r#"
{
    "branch": "homework",
    "messages": [
        {
            "role": "user",
            "content": "What is recursion?"
        },
        {
            "role": "system",
            "content": "<p>Recursion is when a function calls itself.</p>"
        },
        {
            "role": "user",
            "content": "Can you show an example?"
        }
    ]
}
"#
    .trim();
}

pub fn message_reply_fixture() -> &'static str {
    return r#"
{
    "response": "<p>Recursion is when a function calls <em>itself</em>.</p>",
    "index": 1,
    "requests_remaining": 4
}
"#
    .trim();
}

pub fn topics_fixture() -> Vec<String> {
    return vec!["homework".to_string(), "labs".to_string()];
}

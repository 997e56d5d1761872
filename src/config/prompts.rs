//! Fixed prompt texts sent to the models.

/// Context given to the coding agent on every turn.
pub const AGENT_CONTEXT: &str = "Purpose: The primary role of this agent is to assist users by analyzing code. \
It should be able to generate code and answer questions about code provided.";

/// Re-prompt used to coerce the agent's free text into a code record.
/// `{response}` is replaced with the agent output.
pub const CODE_PARSER_TEMPLATE: &str = "Parse the response from a previous LLM into a description and a string of valid code, \
also come up with a valid filename this could be saved as that doesn't contain special characters. \
Here is the response: {response}. You should parse this in the following JSON Format: ";

/// Question-answering template for the documentation query engine.
/// `{context}` and `{query}` are substituted before sending.
pub const QA_TEMPLATE: &str = "Context information is below.\n\
---------------------\n\
{context}\n\
---------------------\n\
Given the context information and not prior knowledge, answer the query.\n\
Query: {query}\n\
Answer: ";

pub const DOCUMENTATION_TOOL_NAME: &str = "api_documentation";
pub const DOCUMENTATION_TOOL_DESCRIPTION: &str =
    "This gives documentation about code for an API. Use this for reading docs for the API.";

pub const CODE_READER_TOOL_NAME: &str = "code_reader";
pub const CODE_READER_TOOL_DESCRIPTION: &str = "This tool can read the contents of code files and returns their results. \
Use this when you need to read the contents of a file.";

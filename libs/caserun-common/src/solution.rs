/// Solution document codec
///
/// Wire format, one record per test case in position order:
///
/// ```json
/// { "tests": [ { "type": "input-output", "input": "1 2\n", "output": "3\n" } ] }
/// ```
///
/// Missing `input`/`output` fields load as empty strings. Records with any
/// other `type` fail the whole document instead of being dropped.
/// Text is carried verbatim; line-ending normalization happens when a case
/// is executed, not here.
use crate::types::{TestCase, TestSuite};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("malformed solution document: {0}")]
pub struct DecodeError(#[from] serde_json::Error);

#[derive(Debug, Serialize, Deserialize)]
struct SolutionData {
    tests: Vec<TestRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
enum TestRecord {
    #[serde(rename = "input-output")]
    InputOutput {
        #[serde(default)]
        input: String,
        #[serde(default)]
        output: String,
    },
}

/// Parse a persisted document. Positions follow record order.
pub fn decode(raw: &[u8]) -> Result<TestSuite, DecodeError> {
    let data: SolutionData = serde_json::from_slice(raw)?;
    let tests = data
        .tests
        .into_iter()
        .map(|record| match record {
            TestRecord::InputOutput { input, output } => TestCase::new(input, output),
        })
        .collect::<Vec<_>>();
    Ok(TestSuite::from(tests))
}

pub fn encode(suite: &TestSuite) -> Vec<u8> {
    let data = SolutionData {
        tests: suite
            .tests()
            .iter()
            .map(|test| TestRecord::InputOutput {
                input: test.input.data.clone(),
                output: test.output.data.clone(),
            })
            .collect(),
    };
    // Strings and vectors of plain records always serialize
    serde_json::to_vec_pretty(&data).unwrap_or_else(|_| b"{\"tests\":[]}".to_vec())
}

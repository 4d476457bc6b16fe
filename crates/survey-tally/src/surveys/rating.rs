use super::domain::{Rating, ResponseViolation, SurveyResponse, SurveySchema};

/// Compute the weighted rating of `response` against `schema`.
///
/// The answer keys must match the question keys exactly. Each term is widened to 64 bits and
/// the sum is checked, so an out-of-range rating is rejected instead of wrapping.
pub fn rate(schema: &SurveySchema, response: &SurveyResponse) -> Result<Rating, ResponseViolation> {
    if !schema.weights().keys().eq(response.answers().keys()) {
        return Err(ResponseViolation::KeyMismatch {
            expected: schema.question_keys(),
            actual: response.answer_keys(),
        });
    }

    schema
        .weights()
        .values()
        .zip(response.answers().values())
        .try_fold(0 as Rating, |total, (&weight, &answer)| {
            total.checked_add(Rating::from(answer) * Rating::from(weight))
        })
        .ok_or(ResponseViolation::RatingOverflow)
}

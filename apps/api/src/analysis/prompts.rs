// LLM prompt templates for the two analysis stages.
// The JSON shapes below are the contract with the model; keep them in sync
// with analysis::records.

/// Persona for the structured extraction stage.
pub const EXTRACTION_PERSONA: &str =
    "You are an expert HR recruiter and technical parser. \
    Extract structured information from resume text.";

/// Extraction prompt template. Replace `{resume_text}` before sending.
pub const EXTRACTION_PROMPT_TEMPLATE: &str = r#"Act as an expert HR recruiter and technical parser. Your task is to extract structured information from the following resume text and return it as a clean, valid JSON object. Do not include any explanatory text or markdown formatting around the JSON.

The JSON object must have the following schema:
{
  "name": "string",
  "email": "string",
  "phone": "string",
  "location": "string",
  "summary": "string",
  "core_skills": ["string"],
  "soft_skills": ["string"],
  "experience": [
    {
      "title": "string",
      "company": "string",
      "dates": "string",
      "description": "string"
    }
  ],
  "education": [
    {
      "degree": "string",
      "institution": "string",
      "year": "string"
    }
  ]
}

Resume Text:
---
{resume_text}
---"#;

/// Persona for the qualitative analysis stage.
pub const ANALYSIS_PERSONA: &str =
    "You are an expert career coach. Critically review structured resume data.";

/// Analysis prompt template. Replace `{resume_json}` before sending.
pub const ANALYSIS_PROMPT_TEMPLATE: &str = r#"Act as an expert career coach. Based on the provided resume data in JSON format, provide a critical analysis.

Return a JSON object with exactly these three keys:
{
  "resume_rating": "integer 1-10",
  "improvement_areas": "string",
  "upskill_suggestions": [
    {
      "skill": "string",
      "rationale": "string"
    }
  ]
}

RULES:
1. resume_rating: an integer score from 1 to 10, where 10 is excellent.
2. improvement_areas: a paragraph with actionable advice and specific examples on how to improve the resume.
3. upskill_suggestions: a list of 3-5 relevant skills to learn, each with a brief, compelling rationale for why it is valuable for the candidate's profile.
4. Return ONLY the JSON object. Nothing else, no code fences.

JSON Resume Data:
---
{resume_json}
---"#;

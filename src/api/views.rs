//! Server-rendered HTML pages.

use crate::services::diagnosis::DiagnosisOutcome;

const STYLE: &str = r#"
body { font-family: Helvetica, Arial, sans-serif; background: #faf5eb; margin: 0; }
main { max-width: 640px; margin: 40px auto; background: #fff; padding: 24px 32px; border-radius: 10px; }
h1 { font-size: 1.5rem; }
label { display: block; margin-top: 12px; }
input, select { width: 100%; padding: 6px; margin-top: 4px; box-sizing: border-box; }
button { margin-top: 16px; padding: 8px 16px; }
.error { color: #c0392b; }
.result { background: #e6f2ff; padding: 12px 16px; border-radius: 8px; margin-top: 16px; }
nav { text-align: right; }
footer { text-align: center; color: #888; font-size: 0.8rem; margin-top: 24px; }
"#;

/// Escapes text for use inside HTML element content and quoted attributes.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            other => out.push(other),
        }
    }
    out
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n<main>\n{body}\n</main>\n</body>\n</html>\n",
        title = escape(title),
    )
}

fn error_block(error: Option<&str>) -> String {
    error
        .map(|e| format!("<p class=\"error\">{}</p>", escape(e)))
        .unwrap_or_default()
}

pub fn signup_page(error: Option<&str>) -> String {
    let body = format!(
        r#"<h1>Create account</h1>
{error}
<form method="post" action="/signup">
<label>Username <input name="username" required></label>
<label>Password <input name="password" type="password" required></label>
<button type="submit">Sign up</button>
</form>
<p>Already registered? <a href="/login">Log in</a></p>"#,
        error = error_block(error)
    );
    layout("Sign up", &body)
}

pub fn login_page(error: Option<&str>) -> String {
    let body = format!(
        r#"<h1>Admin login</h1>
{error}
<form method="post" action="/login">
<label>Username <input name="username" required></label>
<label>Password <input name="password" type="password" required></label>
<button type="submit">Log in</button>
</form>
<p>No account? <a href="/signup">Sign up</a></p>"#,
        error = error_block(error)
    );
    layout("Login", &body)
}

const UPLOAD_FORM: &str = r#"<form method="post" action="/" enctype="multipart/form-data">
<label>Patient name <input name="patient_name"></label>
<label>Age <input name="patient_age" type="number" min="0"></label>
<label>Gender
<select name="patient_gender">
<option value="Male">Male</option>
<option value="Female">Female</option>
<option value="Other">Other</option>
</select>
</label>
<label>MRI image <input name="file" type="file" accept="image/*"></label>
<button type="submit">Analyze</button>
</form>"#;

/// Upload form, followed by the outcome of the last analysis if any.
pub fn index_page(outcome: Option<&DiagnosisOutcome>, year: i32) -> String {
    let result = outcome.map(result_block).unwrap_or_default();
    let body = format!(
        r#"<nav><a href="/logout">Log out</a></nav>
<h1>MRI Brain Tumor Detection</h1>
{UPLOAD_FORM}
{result}
<footer>&copy; {year} Lifecare Diagnostics</footer>"#
    );
    layout("MRI Brain Tumor Detection", &body)
}

fn result_block(outcome: &DiagnosisOutcome) -> String {
    format!(
        r#"<section class="result">
<h2>Result: {result}</h2>
<p>Confidence: {confidence}</p>
<p>Patient: {name} &middot; Age {age} &middot; {gender}</p>
<p><img src="/uploads/{file}" alt="Uploaded MRI" width="256"></p>
<p><a href="/uploads/{file}">View uploaded image</a> &middot; <a href="/static/reports/{report}" download>Download report (PDF)</a></p>
</section>"#,
        result = escape(&outcome.prediction.display_label()),
        confidence = escape(&outcome.prediction.confidence_percent()),
        name = escape(&outcome.patient.name),
        age = escape(&outcome.patient.age),
        gender = escape(&outcome.patient.gender),
        file = escape(&outcome.upload_filename),
        report = escape(&outcome.report_file_name),
    )
}

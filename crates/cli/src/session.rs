//! `nits run` -- the interactive tutoring loop.
//!
//! Questions are picked by the tutor and asked until answered
//! correctly; only the first attempt counts towards the skill model.
//! At any prompt the student can type `concepts`, `skip`, `help` or
//! `quit`.

use std::io::{self, BufRead, Write};

use nits_core::question::{choice_letter, parse_choice, roman_numeral};
use nits_core::{Case, Content, MultipleChoiceQuestion, PropsQuestion, Question};
use nits_tutor::{
    CaseSession, Selection, SubQuestionAnswer, SubQuestionPrompt, Tutor, TutorError,
};
use tokio::runtime::Runtime;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Tutor(#[from] TutorError),
}

/// How a question ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Answered,
    Skipped,
    Quit,
}

enum Reply {
    Line(String),
    Skip,
    Quit,
}

/// Line-oriented student I/O.
pub struct Console<R, W> {
    input: R,
    out: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, out: W) -> Self {
        Console { input, out }
    }

    fn say(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "{}", text)
    }

    /// Reads one answer. Session commands are handled here; `concepts`
    /// prints `explore` and prompts again. End of input is `quit`.
    fn ask(&mut self, prompt: &str, explore: &[String]) -> io::Result<Reply> {
        loop {
            write!(self.out, "{}> ", prompt)?;
            self.out.flush()?;
            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                writeln!(self.out)?;
                return Ok(Reply::Quit);
            }
            let line = line.trim();
            match line.to_lowercase().as_str() {
                "" => continue,
                "quit" | "exit" => return Ok(Reply::Quit),
                "skip" => return Ok(Reply::Skip),
                "help" => {
                    self.say("  concepts  show the concepts behind this question")?;
                    self.say("  skip      drop this question for the rest of the session")?;
                    self.say("  quit      end the session")?;
                }
                "concepts" => {
                    for paragraph in explore {
                        self.say(paragraph)?;
                    }
                }
                _ => return Ok(Reply::Line(line.to_string())),
            }
        }
    }
}

/// Runs questions until the content is exhausted or the student quits.
pub fn run<R: BufRead, W: Write>(
    tutor: &mut Tutor,
    rt: &Runtime,
    console: &mut Console<R, W>,
) -> Result<(), SessionError> {
    let content = tutor.shared_content();
    loop {
        let selection = rt.block_on(tutor.select());
        if let Selection::Fallback { reason, .. } = &selection {
            console.say(&format!(
                "warning: skill estimation unavailable ({}); asking questions in order",
                reason
            ))?;
        }
        let Some(name) = selection.question().map(str::to_string) else {
            console.say("There is nothing left to ask. Well done!")?;
            return Ok(());
        };
        let question = content
            .find_question(&name)
            .ok_or_else(|| TutorError::UnknownQuestion(name.clone()))?;
        let explore = explore_text(&content, question);

        console.say("")?;
        let outcome = match question {
            Question::MultipleChoice(q) => ask_multiple_choice(tutor, console, q, &explore)?,
            Question::Props(q) => ask_props(tutor, console, q, &explore)?,
            Question::Case(case) => ask_case(tutor, rt, console, case, &explore)?,
        };
        match outcome {
            Outcome::Answered => {}
            Outcome::Skipped => tutor.burn(&name)?,
            Outcome::Quit => return Ok(()),
        }
    }
}

fn ask_multiple_choice<R: BufRead, W: Write>(
    tutor: &mut Tutor,
    console: &mut Console<R, W>,
    q: &MultipleChoiceQuestion,
    explore: &[String],
) -> Result<Outcome, SessionError> {
    let options: Vec<_> = q.presentation(tutor.rng()).into_iter().cloned().collect();
    for paragraph in &q.stem {
        console.say(paragraph)?;
    }
    for (i, option) in options.iter().enumerate() {
        console.say(&format!("  {}) {}", choice_letter(i), option.text))?;
    }

    let mut attempts = 0;
    loop {
        let answer = match console.ask("Your answer", explore)? {
            Reply::Line(line) => line,
            Reply::Skip => return Ok(Outcome::Skipped),
            Reply::Quit => return Ok(Outcome::Quit),
        };
        let Some(index) = parse_choice(&answer, options.len()) else {
            console.say(&format!(
                "Please answer with a letter from a to {}.",
                choice_letter(options.len() - 1)
            ))?;
            continue;
        };
        let option = &options[index];
        if let Some(explanation) = &option.explanation {
            for paragraph in &explanation.text {
                console.say(paragraph)?;
            }
        }
        if option.correct {
            console.say("Correct :-)")?;
            tutor.register_answer(&q.short_name, None, attempts == 0)?;
            return Ok(Outcome::Answered);
        }
        console.say("Please try again :-(")?;
        attempts += 1;
    }
}

fn ask_props<R: BufRead, W: Write>(
    tutor: &mut Tutor,
    console: &mut Console<R, W>,
    q: &PropsQuestion,
    explore: &[String],
) -> Result<Outcome, SessionError> {
    console.say("Consider the following propositions:")?;
    for (j, p) in q.propositions.iter().enumerate() {
        console.say(&format!("  {}. {}", roman_numeral(j + 1), p.text))?;
    }
    console.say("Which of the following is right?")?;
    for i in 0..q.choice_count() {
        console.say(&format!("  {}) {}", choice_letter(i), q.choice_text(i)))?;
    }

    let mut attempts = 0;
    loop {
        let answer = match console.ask("Your answer", explore)? {
            Reply::Line(line) => line,
            Reply::Skip => return Ok(Outcome::Skipped),
            Reply::Quit => return Ok(Outcome::Quit),
        };
        match parse_choice(&answer, q.choice_count()) {
            Some(i) if q.is_correct_choice(i) => {
                console.say("Correct :-)")?;
                tutor.register_answer(&q.short_name, None, attempts == 0)?;
                return Ok(Outcome::Answered);
            }
            Some(_) => {
                console.say("Please try again :-(")?;
                attempts += 1;
            }
            None => console.say("Please answer with one of the letters above.")?,
        }
    }
}

fn ask_case<R: BufRead, W: Write>(
    tutor: &mut Tutor,
    rt: &Runtime,
    console: &mut Console<R, W>,
    case: &Case,
    explore: &[String],
) -> Result<Outcome, SessionError> {
    let name = case.short_name();
    for paragraph in case.text() {
        console.say(paragraph)?;
        console.say("")?;
    }

    let mut session = CaseSession::new();
    let mut answered = false;
    while let Some(prompt) = tutor.next_sub_question(name, &mut session)? {
        console.say("")?;
        for line in prompt.text(case) {
            console.say(&line)?;
        }
        let mut attempts = 0;
        loop {
            let answer = match read_sub_answer(console, &prompt, explore)? {
                SubReply::Answer(answer) => answer,
                SubReply::Skip if answered => return Ok(Outcome::Answered),
                SubReply::Skip => return Ok(Outcome::Skipped),
                SubReply::Quit => return Ok(Outcome::Quit),
            };
            if prompt.is_correct(&answer) {
                console.say("Correct :-)")?;
                rt.block_on(tutor.register_sub_answer(name, prompt.kind(), attempts == 0))?;
                answered = true;
                break;
            }
            console.say("Please try again :-(")?;
            attempts += 1;
        }
    }
    if !answered {
        tracing::warn!(case = name, "case has no sub-questions to ask");
        return Ok(Outcome::Skipped);
    }
    Ok(Outcome::Answered)
}

enum SubReply {
    Answer(SubQuestionAnswer),
    Skip,
    Quit,
}

/// Skipping a sub-question leaves the whole case.
fn read_sub_answer<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    prompt: &SubQuestionPrompt,
    explore: &[String],
) -> Result<SubReply, SessionError> {
    let line = |reply: Reply| match reply {
        Reply::Line(line) => Ok(line),
        Reply::Skip => Err(SubReply::Skip),
        Reply::Quit => Err(SubReply::Quit),
    };
    match prompt {
        SubQuestionPrompt::CauseInFact { .. } | SubQuestionPrompt::PrimaFacie { .. } => loop {
            let answer = match line(console.ask("Yes or no", explore)?) {
                Ok(answer) => answer.to_lowercase(),
                Err(reply) => return Ok(reply),
            };
            match answer.as_str() {
                "y" | "yes" => return Ok(SubReply::Answer(SubQuestionAnswer::YesNo(true))),
                "n" | "no" => return Ok(SubReply::Answer(SubQuestionAnswer::YesNo(false))),
                _ => console.say("Please answer yes or no.")?,
            }
        },
        SubQuestionPrompt::Defendants { .. } => {
            console.say("(Enter one name per line, finish with a . on a line of its own)")?;
            let mut names = Vec::new();
            loop {
                match line(console.ask("Name", explore)?) {
                    Ok(name) if name == "." => break,
                    Ok(name) => names.push(name),
                    Err(reply) => return Ok(reply),
                }
            }
            Ok(SubReply::Answer(SubQuestionAnswer::Names(names)))
        }
        SubQuestionPrompt::NegligencePerSe { .. } => {
            match line(console.ask("Your answer", explore)?) {
                Ok(phrase) => Ok(SubReply::Answer(SubQuestionAnswer::Phrase(phrase))),
                Err(reply) => Ok(reply),
            }
        }
    }
}

/// Concept names, explanations, hints and related concepts for the
/// `concepts` command.
fn explore_text(content: &Content, question: &Question) -> Vec<String> {
    let mut out = Vec::new();
    for concept in content.all_concepts(question) {
        out.push(format!("* {}", concept.name));
        if let Some(explanation) = &concept.explanation {
            out.extend(explanation.text.iter().map(|p| format!("    {}", p)));
            out.extend(
                explanation
                    .references
                    .iter()
                    .map(|r| format!("    See: {}", r.text())),
            );
        }
        out.extend(concept.hints.iter().map(|h| format!("    Hint: {}", h)));
        let related: Vec<&str> = concept
            .related
            .iter()
            .filter_map(|id| content.concept(id))
            .map(|c| c.name.as_str())
            .collect();
        if !related.is_empty() {
            out.push(format!("    Related: {}", related.join(", ")));
        }
    }
    out
}

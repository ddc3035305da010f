//! A [`CommandRunner`] that never touches the host.
//!
//! Responses are matched on program name plus an argument prefix; the most
//! recently registered match wins, so a test can change a response halfway
//! through. Unmatched commands succeed with empty output. Every invocation is
//! recorded with its real (unmasked) arguments.

use std::cell::RefCell;

use crate::error::HostError;
use crate::runner::{CommandOutput, CommandRunner, CommandSpec};

/// One recorded call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
}

impl Invocation {
    /// `program arg arg …` with real argument values.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn starts_with(&self, program: &str, prefix: &[&str]) -> bool {
        self.program == program
            && self.args.len() >= prefix.len()
            && self.args.iter().zip(prefix).all(|(a, p)| a == p)
    }
}

type Responder = Box<dyn Fn(&Invocation) -> CommandOutput>;

enum Response {
    /// Same output every time.
    Fixed(CommandOutput),
    Dynamic(Responder),
}

struct Rule {
    program: String,
    prefix: Vec<String>,
    response: Response,
}

#[derive(Default)]
pub struct ScriptedRunner {
    rules: RefCell<Vec<Rule>>,
    calls: RefCell<Vec<Invocation>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&self, program: &str, prefix: &[&str], output: CommandOutput) -> &Self {
        self.push(program, prefix, Response::Fixed(output))
    }

    pub fn on_fn<F>(&self, program: &str, prefix: &[&str], responder: F) -> &Self
    where
        F: Fn(&Invocation) -> CommandOutput + 'static,
    {
        self.push(program, prefix, Response::Dynamic(Box::new(responder)))
    }

    fn push(&self, program: &str, prefix: &[&str], response: Response) -> &Self {
        self.rules.borrow_mut().push(Rule {
            program: program.to_owned(),
            prefix: prefix.iter().map(|s| s.to_string()).collect(),
            response,
        });
        self
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.borrow().clone()
    }

    /// Recorded command lines, in call order.
    pub fn commands(&self) -> Vec<String> {
        self.calls.borrow().iter().map(Invocation::command_line).collect()
    }

    /// Recorded command lines starting with `program prefix…`.
    pub fn commands_matching(&self, program: &str, prefix: &[&str]) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.starts_with(program, prefix))
            .map(Invocation::command_line)
            .collect()
    }

    /// Index of the first call starting with `program prefix…`.
    pub fn position(&self, program: &str, prefix: &[&str]) -> Option<usize> {
        self.calls
            .borrow()
            .iter()
            .position(|c| c.starts_with(program, prefix))
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, command: &CommandSpec) -> Result<CommandOutput, HostError> {
        let invocation = Invocation {
            program: command.program().to_owned(),
            args: command.arg_values(),
            env: command.env_vars().to_vec(),
        };
        self.calls.borrow_mut().push(invocation.clone());

        let rules = self.rules.borrow();
        let rule = rules.iter().rev().find(|r| {
            let prefix: Vec<&str> = r.prefix.iter().map(String::as_str).collect();
            invocation.starts_with(&r.program, &prefix)
        });
        let output = match rule.map(|r| &r.response) {
            None => CommandOutput::success(""),
            Some(Response::Fixed(output)) => output.clone(),
            Some(Response::Dynamic(responder)) => responder(&invocation),
        };
        Ok(output)
    }
}

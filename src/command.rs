use crate::types::Direction;

/// One line of player input, already validated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Forward,
    Left,
    Right,
    TurnAround,
    Face(Direction),
    Sonar,
    Interact,
    Cycle,
    Save,
    Status,
    Help,
    Quit,
}

/// Parses one input line. Unknown words and trailing garbage both come back
/// as None so the caller can print a single uniform hint.
pub fn parse_command(line: &str) -> Option<Command> {
    let mut words = line.split_whitespace();
    let head = words.next()?.to_ascii_lowercase();
    let command = match head.as_str() {
        "forward" | "f" | "move" => Command::Forward,
        "left" | "l" => Command::Left,
        "right" | "r" => Command::Right,
        "turn" => Command::TurnAround,
        "face" => {
            let direction = Direction::parse(&words.next()?.to_ascii_lowercase())?;
            return match words.next() {
                None => Some(Command::Face(direction)),
                Some(_) => None,
            };
        }
        "sonar" | "ping" => Command::Sonar,
        "use" | "interact" => Command::Interact,
        "next" | "cycle" | "tab" => Command::Cycle,
        "save" => Command::Save,
        "status" | "where" => Command::Status,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        _ => return None,
    };
    match words.next() {
        None => Some(command),
        Some(_) => None,
    }
}

pub const HELP_TEXT: &str = "\
commands:
  forward | f        step in the facing direction
  left | right       rotate 90 degrees
  turn               turn around
  face <direction>   face north/east/south/west
  sonar | ping       probe the four directions
  use | interact     pick up, or try the selected item on a lock
  next | cycle       cycle the inventory selection
  save               write the save slot
  status             print the current room and heading
  help | ?           this text
  quit               leave the game";

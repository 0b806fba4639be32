use colored::*;

use crate::terminal::print;

const BANNER: &str = r#"
        ____  __                __
       / __ \/ /_  ____ _____  / /_____  ____ ___
      / /_/ / __ \/ __ `/ __ \/ __/ __ \/ __ `__ \
     / ____/ / / / /_/ / / / / /_/ /_/ / / / / / /
    /_/   /_/ /_/\__,_/_/ /_/\__/\____/_/ /_/ /_/
"#;

pub fn print() {
    for line in BANNER.lines().filter(|line| !line.trim().is_empty()) {
        print::print(&format!("{}", line.bright_black()));
    }
}

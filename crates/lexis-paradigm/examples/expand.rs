use std::env;

use anyhow::{Result, bail};
use lexis_paradigm::ParadigmTable;

fn main() -> Result<()> {
    let mut args = env::args().skip(1);
    let (Some(lemma), Some(template)) = (args.next(), args.next()) else {
        bail!("usage: cargo run -p lexis-paradigm --example expand -- <lemma> <template> [table.json]");
    };
    let table = match args.next() {
        Some(path) => ParadigmTable::load(path)?,
        None => ParadigmTable::builtin(),
    };

    println!("Paradigms loaded: {}", table.len());
    match table.expansion(&lemma, &template) {
        Some(exp) => {
            println!("{lemma} [{}]:", exp.paradigm);
            for form in exp.forms {
                println!("  {form}");
            }
        }
        None if table.is_declension_template(&template) => {
            println!("{template} does not apply to {lemma}");
        }
        None => println!("{template} is not a known declension template"),
    }

    Ok(())
}

use rpncalc::Session;

fn main() {
    let program = vec![
        "( square dup x )",
        "5 square",
        "( _ square ) 1 2 3 map",
        "( _ + ) fold",
        "( broken 1 2",
        "cls 1 10 3 to avg",
    ];

    let mut session = Session::new();
    session.interpreter_mut().set_sink(|message| println!("  » {}", message));
    for source in program {
        match session.run_line(source) {
            Ok(value) => println!("{}: {}", source, value),
            Err(err) => println!("{}: {}", source, err)
        }
    }
}

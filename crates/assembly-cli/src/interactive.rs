//! Menu-driven session: load files step by step, inspect, run.

use crate::report::{self, Trace};
use anyhow::{Context, bail};
use assembly_core::id::ItemIdAllocator;
use assembly_core::item::InventoryItem;
use assembly_core::pipeline::Pipeline;
use assembly_core::sim::{SimulationContext, Ticks};
use assembly_data::loader;
use std::io::{self, BufRead, Write};
use std::path::Path;

const MENU: &str = "
==== Factory Assembly Line Manager ====
1. Load station data files
2. Load customer orders
3. Configure assembly line
4. Display stations (summary)
5. Display stations (detailed)
6. Display customer orders
7. Display assembly line configuration
8. Run simulation
9. Display completed orders
10. Display incomplete orders
11. Display remaining inventory
0. Exit
Enter your choice: ";

/// A configured line together with its trace subscription.
struct Configured {
    line: Pipeline,
    trace: Trace,
}

pub struct Session<R, W> {
    input: R,
    out: W,
    max_ticks: Ticks,
    ids: ItemIdAllocator,
    /// Stations loaded so far. The configured line works on a copy.
    items: Vec<InventoryItem>,
    ctx: SimulationContext,
    stations_loaded: bool,
    orders_loaded: bool,
    configured: Option<Configured>,
    simulation_run: bool,
}

impl<R: BufRead, W: Write> Session<R, W> {
    pub fn new(input: R, out: W, max_ticks: Ticks) -> Self {
        Self {
            input,
            out,
            max_ticks,
            ids: ItemIdAllocator::new(),
            items: Vec::new(),
            ctx: SimulationContext::new(),
            stations_loaded: false,
            orders_loaded: false,
            configured: None,
            simulation_run: false,
        }
    }

    /// Show the menu and dispatch choices until `0` or end of input.
    /// Command failures are reported and the menu continues.
    pub fn run(&mut self) -> io::Result<()> {
        loop {
            write!(self.out, "{MENU}")?;
            self.out.flush()?;

            let Some(line) = self.read_line()? else {
                writeln!(self.out)?;
                return Ok(());
            };
            let choice = match line.trim().parse::<u32>() {
                Ok(0) => {
                    writeln!(self.out, "Exiting program...")?;
                    return Ok(());
                }
                Ok(choice) => choice,
                Err(_) => {
                    writeln!(self.out, "Invalid choice. Please try again.")?;
                    continue;
                }
            };

            if let Err(err) = self.dispatch(choice) {
                tracing::debug!(choice, error = %err, "menu command failed");
                writeln!(self.out, "Error: {err:#}")?;
            }
        }
    }

    fn dispatch(&mut self, choice: u32) -> anyhow::Result<()> {
        match choice {
            1 => self.load_stations(),
            2 => self.load_orders(),
            3 => self.configure_line(),
            4 => self.show_stations(false),
            5 => self.show_stations(true),
            6 => self.show_orders(),
            7 => self.show_line(),
            8 => self.run_simulation(),
            9 | 10 => self.show_processed(choice == 9),
            11 => self.show_inventory(),
            _ => Ok(writeln!(self.out, "Invalid choice. Please try again.")?),
        }
    }

    // -----------------------------------------------------------------------
    // Input
    // -----------------------------------------------------------------------

    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut buf = String::new();
        if self.input.read_line(&mut buf)? == 0 {
            return Ok(None);
        }
        Ok(Some(buf.trim_end_matches(['\r', '\n']).to_string()))
    }

    fn prompt(&mut self, text: &str) -> anyhow::Result<String> {
        write!(self.out, "{text}")?;
        self.out.flush()?;
        match self.read_line()? {
            Some(answer) => Ok(answer.trim().to_string()),
            None => bail!("unexpected end of input"),
        }
    }

    fn prompt_delimiter(&mut self, text: &str) -> anyhow::Result<char> {
        let answer = self.prompt(text)?;
        let Some(delimiter) = answer.chars().next() else {
            bail!("a delimiter is required");
        };
        Ok(delimiter)
    }

    fn say(&mut self, text: &str) -> anyhow::Result<()> {
        writeln!(self.out, "{text}")?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    fn load_stations(&mut self) -> anyhow::Result<()> {
        if self.stations_loaded {
            return self.say("Stations are already loaded. Clear them first.");
        }

        let first = self.prompt("Enter first station file name: ")?;
        let first_delimiter = self.prompt_delimiter("Enter delimiter for first file: ")?;
        let second = self.prompt("Enter second station file name (or press Enter to skip): ")?;
        let second_delimiter = if second.is_empty() {
            None
        } else {
            Some(self.prompt_delimiter("Enter delimiter for second file: ")?)
        };

        let mut ids = self.ids.clone();
        let tokenizer = loader::tokenizer_for(first_delimiter)?;
        let mut items = loader::load_stations(Path::new(&first), &tokenizer, &mut ids)?;
        if let Some(delimiter) = second_delimiter {
            let tokenizer = loader::tokenizer_for(delimiter)?;
            items.extend(loader::load_stations(Path::new(&second), &tokenizer, &mut ids)?);
        }

        self.ids = ids;
        self.items = items;
        self.stations_loaded = true;
        self.say("Stations loaded successfully.")
    }

    fn load_orders(&mut self) -> anyhow::Result<()> {
        if !self.stations_loaded {
            return self.say("Please load stations first.");
        }
        if self.orders_loaded {
            return self.say("Orders are already loaded. Clear them first.");
        }

        let file = self.prompt("Enter order file name: ")?;
        let delimiter = self.prompt_delimiter("Enter delimiter for order file: ")?;
        let tokenizer = loader::tokenizer_for(delimiter)?;
        for order in loader::load_orders(Path::new(&file), &tokenizer)? {
            self.ctx.push_pending(order);
        }

        self.orders_loaded = true;
        self.say("Orders loaded successfully.")
    }

    fn configure_line(&mut self) -> anyhow::Result<()> {
        if !self.stations_loaded || !self.orders_loaded {
            return self.say("Please load stations and orders first.");
        }
        if self.configured.is_some() {
            return self.say("Assembly line is already configured. Clear it first.");
        }

        let file = self.prompt("Enter assembly line configuration file name: ")?;
        let delimiter =
            self.prompt_delimiter("Enter delimiter for assembly line configuration file: ")?;
        let tokenizer = loader::tokenizer_for(delimiter)?;
        let links = loader::load_topology(Path::new(&file), &tokenizer)?;

        let mut line = Pipeline::new(self.items.clone(), &links, &self.ctx)
            .with_context(|| format!("cannot configure line from {file}"))?;
        line.reorder_stations()?;
        let trace = Trace::attach(&mut line);

        self.configured = Some(Configured { line, trace });
        self.say("Assembly line configured successfully.")
    }

    fn show_stations(&mut self, full: bool) -> anyhow::Result<()> {
        if !self.stations_loaded {
            return self.say("Please load stations first.");
        }
        let title = if full {
            "Stations (full)"
        } else {
            "Stations (summary)"
        };
        report::banner(&mut self.out, title)?;
        match &self.configured {
            Some(c) => report::write_stations(&mut self.out, c.line.stations().map(|s| s.item()), full)?,
            None => report::write_stations(&mut self.out, &self.items, full)?,
        }
        Ok(())
    }

    fn show_orders(&mut self) -> anyhow::Result<()> {
        if !self.orders_loaded {
            return self.say("Please load orders first.");
        }
        report::banner(&mut self.out, "Orders")?;
        report::write_orders(&mut self.out, self.ctx.pending())?;
        Ok(())
    }

    fn show_line(&mut self) -> anyhow::Result<()> {
        let Some(configured) = &self.configured else {
            return self.say("Please configure assembly line first.");
        };
        report::banner(&mut self.out, "Display Stations (ordered)")?;
        report::write_line(&mut self.out, &configured.line)?;
        Ok(())
    }

    fn run_simulation(&mut self) -> anyhow::Result<()> {
        let Some(configured) = &mut self.configured else {
            return self.say("Please configure assembly line first.");
        };
        report::banner(&mut self.out, "Filling Orders")?;

        let result = configured.line.run(&mut self.ctx, self.max_ticks);
        configured.trace.flush(&mut self.out)?;
        result?;

        self.simulation_run = true;
        self.say("Simulation completed.")
    }

    fn show_processed(&mut self, completed: bool) -> anyhow::Result<()> {
        if !self.simulation_run {
            return self.say("Please run the simulation first.");
        }
        if completed {
            report::banner(&mut self.out, "Processed Orders (complete)")?;
            report::write_orders(&mut self.out, self.ctx.completed())?;
        } else {
            report::banner(&mut self.out, "Processed Orders (incomplete)")?;
            report::write_orders(&mut self.out, self.ctx.incomplete())?;
        }
        Ok(())
    }

    fn show_inventory(&mut self) -> anyhow::Result<()> {
        if !self.simulation_run {
            return self.say("Please run the simulation first.");
        }
        let Some(configured) = &self.configured else {
            return self.say("Please configure assembly line first.");
        };
        report::banner(&mut self.out, "Inventory (full)")?;
        report::write_stations(&mut self.out, configured.line.stations().map(|s| s.item()), true)?;
        Ok(())
    }
}

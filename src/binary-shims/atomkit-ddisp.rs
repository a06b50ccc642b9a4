fn main() { atomkit_tasks::entry_points::ddisp() }

fn main() { atomkit_tasks::entry_points::dislocation() }
